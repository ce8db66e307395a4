//! Property-based tests for statement execution and the query log
//!
//! These tests verify the executor's contract over generated inputs:
//! - A parameter set matching the statement's placeholders always binds
//! - Mismatches in either direction are rejected, whatever the names
//! - Bound text reaches the database verbatim, never as SQL
//! - Every execution leaves exactly one query log entry, in order

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use miniblog::core::db::{ConnectionConfig, ConnectionHandle, Params, SqlValue};

    fn open_handle() -> ConnectionHandle {
        ConnectionHandle::open(ConnectionConfig::in_memory()).unwrap()
    }

    /// Distinct lowercase parameter names. Letters only, so a name with a
    /// digit can never collide with a generated one.
    fn arb_param_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set("[a-z]{1,8}", 1..5).prop_map(|names| {
            let mut names: Vec<String> = names.into_iter().collect();
            names.sort();
            names
        })
    }

    /// A SELECT that echoes every named parameter back under a `c_`-prefixed
    /// alias (the prefix keeps generated names clear of SQL keywords).
    fn echo_select(names: &[String]) -> String {
        let select_list: Vec<String> = names
            .iter()
            .map(|name| format!(":{} AS c_{}", name, name))
            .collect();
        format!("SELECT {}", select_list.join(", "))
    }

    proptest! {
        /// A parameter set that covers the placeholders exactly always binds,
        /// and every value comes back unchanged.
        #[test]
        fn prop_exact_param_sets_bind(names in arb_param_names()) {
            let mut handle = open_handle();
            let sql = echo_select(&names);

            let mut params = Params::new();
            for (i, name) in names.iter().enumerate() {
                params = params.set(name.as_str(), i as i64);
            }

            let result = handle.execute(&sql, &params).unwrap();
            let row = result.single_row().unwrap();
            for (i, name) in names.iter().enumerate() {
                prop_assert_eq!(row.get_i64(&format!("c_{}", name)), Some(i as i64));
            }
        }

        /// Leaving any placeholder uncovered is rejected before execution,
        /// and the rejection is logged like any other failure.
        #[test]
        fn prop_missing_parameter_is_rejected(names in arb_param_names()) {
            let mut handle = open_handle();
            let sql = echo_select(&names);

            let mut params = Params::new();
            for (i, name) in names.iter().enumerate().skip(1) {
                params = params.set(name.as_str(), i as i64);
            }

            let err = handle.execute(&sql, &params).unwrap_err();
            prop_assert!(err.to_string().contains("parameter(s) but"));
            prop_assert_eq!(handle.query_log().len(), 1);
            prop_assert!(!handle.query_log().last().unwrap().succeeded());
        }

        /// A parameter naming no placeholder is rejected, whatever its value.
        #[test]
        fn prop_unknown_parameter_is_rejected(names in arb_param_names(), value in any::<i64>()) {
            let mut handle = open_handle();
            let sql = echo_select(&names);

            let mut params = Params::new();
            for (i, name) in names.iter().enumerate() {
                params = params.set(name.as_str(), i as i64);
            }
            params = params.set("extra9", value);

            let err = handle.execute(&sql, &params).unwrap_err();
            prop_assert!(err.to_string().contains("does not match any placeholder"));
        }

        /// Bound text is data: whatever it contains, it round-trips verbatim
        /// and never alters the statement.
        #[test]
        fn prop_bound_text_round_trips_verbatim(text in "[ -~]{0,60}", number in any::<i64>()) {
            let mut handle = open_handle();
            handle
                .execute("CREATE TABLE t (s TEXT, n INTEGER)", &Params::new())
                .unwrap();
            handle
                .execute(
                    "INSERT INTO t (s, n) VALUES (:s, :n)",
                    &Params::new().set("s", text.as_str()).set("n", number),
                )
                .unwrap();

            let rows = handle.query_all("SELECT s, n FROM t").unwrap();
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(rows[0].get("s"), Some(&SqlValue::Text(text.clone())));
            prop_assert_eq!(rows[0].get("n"), Some(&SqlValue::Integer(number)));
        }

        /// Every execution appends exactly one log entry, in order, with the
        /// outcome fields filled in mutually exclusively.
        #[test]
        fn prop_every_statement_logs_exactly_one_entry(
            fail_mask in prop::collection::vec(any::<bool>(), 1..12)
        ) {
            let mut handle = open_handle();
            handle
                .execute("CREATE TABLE t (x INTEGER)", &Params::new())
                .unwrap();

            for (i, fail) in fail_mask.iter().enumerate() {
                if *fail {
                    let _ = handle.execute(
                        "INSERT INTO missing_table (x) VALUES (:x)",
                        &Params::new().set("x", i as i64),
                    );
                } else {
                    handle
                        .execute(
                            "INSERT INTO t (x) VALUES (:x)",
                            &Params::new().set("x", i as i64),
                        )
                        .unwrap();
                }
            }

            prop_assert_eq!(handle.query_log().len(), fail_mask.len() + 1);
            for (entry, fail) in handle
                .query_log()
                .entries()
                .iter()
                .skip(1)
                .zip(fail_mask.iter())
            {
                prop_assert_eq!(entry.succeeded(), !fail);
                prop_assert_eq!(entry.row_count.is_none(), entry.error.is_some());
            }
        }
    }

    /// A classic hostile literal stays inert when it travels as a parameter.
    #[test]
    fn test_quote_heavy_text_is_data_not_sql() {
        let mut handle = open_handle();
        handle
            .execute("CREATE TABLE t (s TEXT)", &Params::new())
            .unwrap();

        let hostile = "Robert'); DROP TABLE t;--";
        handle
            .execute(
                "INSERT INTO t (s) VALUES (:s)",
                &Params::new().set("s", hostile),
            )
            .unwrap();

        let rows = handle.query_all("SELECT s FROM t").unwrap();
        assert_eq!(rows[0].get_str("s"), Some(hostile));

        // the table survived its own contents
        let count = handle.query_all("SELECT COUNT(*) AS n FROM t").unwrap();
        assert_eq!(count[0].get_i64("n"), Some(1));
    }
}
