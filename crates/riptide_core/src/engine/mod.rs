//! Sessions and the staged execution pipeline.

pub mod commands;
pub mod query;
pub mod session;
pub mod vars;

pub use query::QueryExecution;
pub use session::{Engine, Session, SessionState};
pub use vars::SessionVars;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::arrays::row::Row;
    use crate::arrays::scalar::ScalarValue;
    use crate::expr::aggregate_expr::{AggregateExpr, AggregateFunction};
    use crate::expr::attribute::Attribute;
    use crate::expr::{add, col_named, gt, lit};
    use crate::logical::logical_order::SortExpr;
    use crate::logical::operator::LogicalOperator;
    use crate::physical::plan::PhysicalPlan;
    use crate::row;
    use crate::runtime::collection::RowCollection;

    fn session() -> Session {
        logutil::init_test();
        Engine::new().new_session()
    }

    /// Register `t(k, v)` with four rows spread over three partitions.
    fn register_numbers(session: &Session) {
        let attrs = vec![
            Attribute::new("k", DataType::Int64, false),
            Attribute::new("v", DataType::Int64, false),
        ];
        let rows = vec![row![1, 10], row![2, 20], row![1, 30], row![2, 40]];
        session.register_table(
            "t",
            LogicalOperator::scan(
                Some("t".to_string()),
                RowCollection::from_rows(rows, 3),
                attrs,
            ),
        );
    }

    fn int(value: &ScalarValue) -> i64 {
        match value {
            ScalarValue::Int64(v) => *v,
            other => panic!("not an int: {other}"),
        }
    }

    fn sorted(mut rows: Vec<Row>) -> Vec<Row> {
        rows.sort_by_key(|row| row.columns.iter().map(int).collect::<Vec<_>>());
        rows
    }

    #[test]
    fn filter_only_columns_stay_out_of_the_output() {
        let session = session();
        register_numbers(&session);

        // v feeds the filter but only k is projected, so rows must come back
        // one column wide, matching the resolved output schema.
        let plan = LogicalOperator::project(
            LogicalOperator::filter(
                LogicalOperator::unresolved_scan("t"),
                gt(col_named("v"), lit(15_i64)),
            ),
            vec![col_named("k")],
        );

        let execution = session.submit(plan);
        let schema = execution.output_schema().unwrap();
        assert_eq!(1, schema.fields.len());

        let rows = sorted(execution.collect().unwrap());
        assert!(rows
            .iter()
            .all(|row| row.columns.len() == schema.fields.len()));
        assert_eq!(vec![row![1], row![2], row![2]], rows);
    }

    #[test]
    fn plain_projection_preserves_column_order() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::project(
            LogicalOperator::unresolved_scan("t"),
            vec![col_named("v"), col_named("k")],
        );

        let rows = sorted(session.execute(plan).unwrap());
        assert_eq!(
            vec![row![10, 1], row![20, 2], row![30, 1], row![40, 2]],
            rows
        );
    }

    #[test]
    fn expression_projection_evaluates_through_a_project() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::project(
            LogicalOperator::unresolved_scan("t"),
            vec![add(col_named("v"), lit(1_i64))],
        );

        let rows = sorted(session.execute(plan).unwrap());
        assert_eq!(vec![row![11], row![21], row![31], row![41]], rows);
    }

    #[test]
    fn stages_are_memoized() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::order(
            LogicalOperator::unresolved_scan("t"),
            vec![SortExpr {
                expr: col_named("v"),
                desc: false,
            }],
        );
        let execution = session.submit(plan);

        let analyzed = execution.analyzed_plan().unwrap();
        assert_eq!(analyzed, execution.analyzed_plan().unwrap());

        // The boundary pass rewrites a clone; the physical stage stays as
        // planned even after the executable stage exists.
        let physical = execution.physical_plan().unwrap();
        let executable = execution.executed_plan().unwrap();
        assert_eq!(physical, execution.physical_plan().unwrap());
        assert_ne!(physical, executable);
        assert_eq!(executable, execution.executed_plan().unwrap());

        let mut exchanges = 0;
        executable
            .for_each(&mut |op| {
                if matches!(op, PhysicalPlan::Exchange(_)) {
                    exchanges += 1;
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(1, exchanges);

        let rows = execution.collect().unwrap();
        assert_eq!(vec![row![1, 10], row![2, 20], row![1, 30], row![2, 40]], rows);
    }

    #[test]
    fn grouped_aggregate_runs_through_an_exchange() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::aggregate(
            LogicalOperator::unresolved_scan("t"),
            vec![col_named("k")],
            vec![AggregateExpr::new(AggregateFunction::Sum, col_named("v"))],
        );
        let execution = session.submit(plan);

        let mut saw_hash_exchange = false;
        execution
            .executed_plan()
            .unwrap()
            .for_each(&mut |op| {
                if let PhysicalPlan::Exchange(ex) = op {
                    saw_hash_exchange |= matches!(
                        ex.target,
                        crate::runtime::partitioning::Partitioning::Hash { .. }
                    );
                }
                Ok(())
            })
            .unwrap();
        assert!(saw_hash_exchange);

        let rows = sorted(execution.collect().unwrap());
        assert_eq!(vec![row![1, 40], row![2, 60]], rows);
    }

    #[test]
    fn union_concatenates_registered_tables() {
        let session = session();
        register_numbers(&session);
        let attrs = vec![
            Attribute::new("k", DataType::Int64, false),
            Attribute::new("v", DataType::Int64, false),
        ];
        session.register_table(
            "u",
            LogicalOperator::scan(
                Some("u".to_string()),
                RowCollection::from_rows(vec![row![3, 50], row![4, 60]], 2),
                attrs,
            ),
        );

        let plan = LogicalOperator::union(
            LogicalOperator::unresolved_scan("t"),
            LogicalOperator::unresolved_scan("u"),
        );
        let rows = sorted(session.execute(plan).unwrap());

        // Rows from both sides keep their full width.
        assert!(rows.iter().all(|row| row.columns.len() == 2));
        assert_eq!(
            vec![
                row![1, 10],
                row![1, 30],
                row![2, 20],
                row![2, 40],
                row![3, 50],
                row![4, 60]
            ],
            rows
        );
    }

    #[test]
    fn limit_with_offset_after_sort() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::limit(
            LogicalOperator::order(
                LogicalOperator::unresolved_scan("t"),
                vec![SortExpr {
                    expr: col_named("v"),
                    desc: true,
                }],
            ),
            1,
            2,
        );

        let rows = session.execute(plan).unwrap();
        assert_eq!(vec![row![1, 30], row![2, 20]], rows);
    }

    #[test]
    fn set_command_result_is_memoized() {
        let session = session();
        let execution = session.submit(LogicalOperator::set_var(
            Some(vars::SHUFFLE_COUNT.to_string()),
            Some("4".to_string()),
        ));

        let first = execution.collect().unwrap();
        let second = execution.collect().unwrap();
        assert_eq!(first, second);
        assert_eq!(vec![row![vars::SHUFFLE_COUNT, "4"]], first);
        assert_eq!(4, session.vars().shuffle_partitions());
    }

    #[test]
    fn set_without_key_enumerates_settings() {
        let session = session();
        let rows = session
            .execute(LogicalOperator::set_var(None, None))
            .unwrap();
        assert!(rows.len() >= 3);
        assert!(rows
            .iter()
            .any(|row| row.columns[0] == ScalarValue::Utf8(vars::SHUFFLE_COUNT.to_string())));
    }

    #[test]
    fn sessions_are_isolated() {
        let engine = Engine::new();
        let first = engine.new_session();
        let second = engine.new_session();
        register_numbers(&first);

        assert!(first
            .execute(LogicalOperator::unresolved_scan("t"))
            .is_ok());
        assert!(second
            .execute(LogicalOperator::unresolved_scan("t"))
            .is_err());
    }

    #[test]
    fn explain_captures_resolution_failures() {
        let session = session();
        let rows = session
            .execute(LogicalOperator::explain(
                LogicalOperator::unresolved_scan("missing"),
                true,
            ))
            .unwrap();

        let text: Vec<String> = rows
            .into_iter()
            .map(|row| match row.columns.into_iter().next() {
                Some(ScalarValue::Utf8(line)) => line,
                other => panic!("not a text line: {other:?}"),
            })
            .collect();
        assert!(text.iter().any(|line| line.starts_with("error:")));
        assert!(text.iter().any(|line| line.contains("Analyzed Plan")));
    }

    #[test]
    fn brief_explain_shows_only_the_executable_stage() {
        let session = session();
        register_numbers(&session);

        let rows = session
            .execute(LogicalOperator::explain(
                LogicalOperator::unresolved_scan("t"),
                false,
            ))
            .unwrap();
        let text = rows
            .iter()
            .map(|row| row.columns[0].to_string())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Executable Plan"));
        assert!(!text.contains("Analyzed Plan"));
    }

    #[test]
    fn output_schema_reflects_the_resolved_plan() {
        let session = session();
        register_numbers(&session);

        let execution = session.submit(LogicalOperator::unresolved_scan("t"));
        let schema = execution.output_schema().unwrap();
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(vec!["k", "v"], names);
        assert_eq!(DataType::Int64, schema.fields[0].datatype);
    }

    #[test]
    fn explain_json_renders_the_executable_plan() {
        let session = session();
        register_numbers(&session);

        let execution = session.submit(LogicalOperator::unresolved_scan("t"));
        let json = execution.explain_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!("Scan", parsed["name"]);
    }

    #[test]
    fn describe_lists_resolved_columns() {
        let session = session();
        register_numbers(&session);

        let rows = session
            .execute(LogicalOperator::describe(LogicalOperator::unresolved_scan(
                "t",
            )))
            .unwrap();
        assert_eq!(
            vec![
                row!["col_name", "data_type"],
                row!["k", "Int64"],
                row!["v", "Int64"]
            ],
            rows
        );
    }

    #[test]
    fn cache_and_uncache_round_trip() {
        let session = session();
        register_numbers(&session);

        let plan = LogicalOperator::filter(
            LogicalOperator::unresolved_scan("t"),
            gt(col_named("v"), lit(15_i64)),
        );
        let before = sorted(session.execute(plan.clone()).unwrap());

        session
            .execute(LogicalOperator::cache_table("t"))
            .unwrap();
        assert!(session.catalog().is_cached("t"));
        let cached = sorted(session.execute(plan.clone()).unwrap());
        assert_eq!(before, cached);

        session
            .execute(LogicalOperator::uncache_table("t"))
            .unwrap();
        assert!(!session.catalog().is_cached("t"));
        let after = sorted(session.execute(plan).unwrap());
        assert_eq!(before, after);

        // Uncaching a table that isn't cached propagates, unlike explain.
        assert!(session
            .execute(LogicalOperator::uncache_table("t"))
            .is_err());
    }
}
