//! Property-based tests for literal escaping and keyed results
//!
//! These tests check that:
//! - Any escaped string survives a round trip through a SQL literal
//! - Keyed results keep one row per key, with the last row winning

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::HashMap;

    use sqlgate::core::db::{escape_string, quote_literal};
    use sqlgate::{Database, DatabaseConfig, Value};

    fn arb_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,30}",
            "[a-z']{0,20}",
            any::<String>().prop_map(|s| s.replace('\0', "")),
        ]
    }

    proptest! {
        #[test]
        fn escaped_text_round_trips(text in arb_text()) {
            let db = Database::new(DatabaseConfig::in_memory());
            let value = db.value(&format!("SELECT '{}'", db.quote(&text))).unwrap();
            prop_assert_eq!(value, Some(Value::Text(text)));
        }

        #[test]
        fn escaping_never_leaves_a_lone_quote(text in any::<String>()) {
            let escaped = escape_string(&text);
            prop_assert!(!escaped.contains('\0'));
            prop_assert_eq!(escaped.replace("''", "").contains('\''), false);
            prop_assert_eq!(quote_literal(&text), format!("'{}'", escaped));
        }

        #[test]
        fn keyed_rows_keep_last_row_per_key(pairs in prop::collection::vec((0u8..5, any::<i32>()), 0..20)) {
            let db = Database::new(DatabaseConfig::in_memory());
            db.execute("CREATE TABLE kv (seq INTEGER PRIMARY KEY, k INTEGER, v INTEGER)").unwrap();
            for (k, v) in &pairs {
                db.execute(&format!("INSERT INTO kv (k, v) VALUES ({}, {})", k, v)).unwrap();
            }

            let keyed = db.rows_keyed("SELECT k, v FROM kv ORDER BY seq", "k").unwrap();

            let mut expected = HashMap::new();
            let mut order = Vec::new();
            for (k, v) in &pairs {
                if expected.insert(k.to_string(), *v).is_none() {
                    order.push(k.to_string());
                }
            }
            prop_assert_eq!(keyed.keys().map(str::to_string).collect::<Vec<_>>(), order);
            for (k, v) in expected {
                prop_assert_eq!(keyed.get(&k).map(|row| row[1].clone()), Some(Value::Integer(v as i64)));
            }
        }
    }
}
