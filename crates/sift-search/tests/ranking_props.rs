use proptest::prelude::*;
use sift_core::Document;
use sift_core::config::FusionConfig;
use sift_search::duplicates::DuplicateClusterer;
use sift_search::fusion::{FusionInputs, fuse};
use sift_search::lexical::LexicalIndex;
use sift_search::signal::SignalResult;
use std::collections::BTreeSet;

fn uncapped() -> FusionConfig {
    FusionConfig {
        max_results: usize::MAX,
        ..FusionConfig::default()
    }
}

fn fused_score(query: &str, fuzzy: &[f64], target: usize) -> f64 {
    let inputs = FusionInputs {
        fuzzy: fuzzy
            .iter()
            .enumerate()
            .map(|(i, s)| SignalResult::new(format!("{i}.txt"), format!("/{i}.txt"), "body", *s))
            .collect(),
        ..FusionInputs::default()
    };
    let name = format!("{target}.txt");
    fuse(query, &inputs, &[], &uncapped(), None)
        .into_iter()
        .find(|r| r.filename == name)
        .map_or(0.0, |r| r.score)
}

fn group_names(docs: &[Document]) -> BTreeSet<BTreeSet<String>> {
    DuplicateClusterer::default()
        .with_threshold(0.5)
        .cluster(docs)
        .iter()
        .map(|g| g.documents(docs).iter().map(|d| d.filename.clone()).collect())
        .collect()
}

proptest! {
    #[test]
    fn raising_one_signal_never_lowers_fused_score(
        scores in prop::collection::vec(0.0_f64..100.0, 1..8),
        pick in any::<prop::sample::Index>(),
        delta in 0.0_f64..50.0,
    ) {
        let target = pick.index(scores.len());
        let before = fused_score("zzz", &scores, target);
        let mut raised = scores.clone();
        raised[target] += delta;
        let after = fused_score("zzz", &raised, target);
        prop_assert!(after + 1e-9 >= before, "{before} -> {after}");
    }

    #[test]
    fn exact_stem_outranks_stem_substring(
        query in "[a-z]{3,8}",
        suffix in "[a-z]{1,4}",
        raw in 0.0_f64..100.0,
    ) {
        let exact = format!("{query}.txt");
        let partial = format!("{query}-{suffix}.txt");
        let inputs = FusionInputs {
            tfidf: vec![
                SignalResult::new(&partial, "/p", "body", raw),
                SignalResult::new(&exact, "/e", "body", raw),
            ],
            ..FusionInputs::default()
        };
        let out = fuse(&query, &inputs, &[], &uncapped(), None);
        prop_assert_eq!(&out[0].filename, &exact);
        prop_assert!(out[0].score > out[1].score);
    }

    #[test]
    fn grouping_ignores_input_order(
        texts in prop::collection::vec(
            prop::collection::vec(prop::sample::select(vec!["apple", "pear", "plum", "fig", "kiwi"]), 1..4),
            2..8,
        ),
        seed in any::<u64>(),
    ) {
        let docs: Vec<Document> = texts
            .iter()
            .enumerate()
            .map(|(i, words)| Document::new(format!("{i}.txt"), format!("/{i}.txt"), words.join(" ")))
            .collect();

        let mut rotated = docs.clone();
        let len = rotated.len();
        rotated.rotate_left(usize::try_from(seed % len as u64).unwrap_or(0));
        rotated.reverse();

        prop_assert_eq!(group_names(&docs), group_names(&rotated));
    }

    #[test]
    fn document_is_most_similar_to_itself(
        corpus in prop::collection::vec(prop::collection::vec("zq[a-z]{1,4}", 1..6), 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let docs: Vec<Document> = corpus
            .iter()
            .enumerate()
            .map(|(i, words)| Document::new(format!("{i}.txt"), format!("/{i}.txt"), words.join(" ")))
            .collect();
        let index = LexicalIndex::fit(&docs);
        prop_assert!(index.is_fit());

        let target = &docs[pick.index(docs.len())];
        let hits = index.query(&target.text, docs.len());
        prop_assert!((hits[0].raw_score() - 1.0).abs() < 1e-9);
        prop_assert!(hits.iter().all(|h| h.raw_score() <= 1.0 + 1e-9));
    }
}
