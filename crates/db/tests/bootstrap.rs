use sqlx::PgPool;

/// Connect, migrate, verify the workflow tables exist.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    examark_db::health_check(&pool).await.unwrap();

    let tables = [
        "subjects",
        "rubrics",
        "rubric_questions",
        "evaluators",
        "evaluator_subjects",
        "subject_progress",
        "tasks",
        "work_items",
        "pages",
        "annotations",
        "mark_tallies",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Unique indexes that back conflict detection follow the uq_ prefix
/// convention the error mapper keys on.
#[sqlx::test(migrations = "./migrations")]
async fn test_unique_indexes_use_uq_prefix(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT indexname FROM pg_indexes \
         WHERE schemaname = 'public' AND indexdef LIKE 'CREATE UNIQUE%' \
           AND indexname NOT LIKE '%_pkey'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!names.is_empty());
    for (name,) in names {
        assert!(name.starts_with("uq_"), "unexpected index name {name}");
    }
}
