//! Property tests for snapshot persistence.

use rag_engine::{DocumentId, DocumentStore, Metadata, MetadataValue};
use proptest::prelude::*;

const DIM: usize = 6;

fn arb_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => any::<f64>().prop_filter("finite", |x| x.is_finite()),
        1 => Just(f64::MAX),
        1 => Just(f64::MIN),
        1 => Just(f64::MIN_POSITIVE),
        1 => Just(f64::MIN_POSITIVE / 2.0),
        1 => Just(f64::from_bits(1)),
    ]
}

fn arb_metadata_value() -> impl Strategy<Value = MetadataValue> {
    prop_oneof![
        any::<bool>().prop_map(MetadataValue::Bool),
        arb_number().prop_map(MetadataValue::Number),
        "[a-zA-Z0-9 ก-ฮ]{0,12}".prop_map(MetadataValue::String),
    ]
}

fn number_bits(metadata: &Metadata) -> Vec<(String, u64)> {
    metadata
        .iter()
        .filter_map(|(key, value)| match value {
            MetadataValue::Number(n) => Some((key.clone(), n.to_bits())),
            _ => None,
        })
        .collect()
}

fn arb_document() -> impl Strategy<Value = (String, Vec<f32>, Metadata)> {
    (
        "[a-z ก-ฮ]{1,30}",
        proptest::collection::vec(any::<f32>().prop_filter("finite", |x| x.is_finite()), DIM),
        proptest::collection::btree_map("[a-z_]{1,8}", arb_metadata_value(), 0..4),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn reload_returns_identical_documents(
        documents in proptest::collection::vec(arb_document(), 0..12),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");

        let mut store = DocumentStore::load(&path, Some(DIM)).unwrap();
        for (text, embedding, metadata) in &documents {
            store.append(text, embedding.clone(), metadata.clone()).unwrap();
        }

        let reloaded = DocumentStore::load(&path, Some(DIM)).unwrap();
        prop_assert_eq!(reloaded.len(), documents.len());
        for (i, (text, embedding, metadata)) in documents.iter().enumerate() {
            let doc = reloaded.get(DocumentId(i)).unwrap();
            prop_assert_eq!(&doc.text, text);
            let stored: Vec<u32> = doc.embedding.iter().map(|x| x.to_bits()).collect();
            let original: Vec<u32> = embedding.iter().map(|x| x.to_bits()).collect();
            prop_assert_eq!(stored, original);
            prop_assert_eq!(&doc.metadata, metadata);
            prop_assert_eq!(number_bits(&doc.metadata), number_bits(metadata));
        }
    }
}
