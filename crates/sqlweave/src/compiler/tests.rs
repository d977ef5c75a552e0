use super::*;
use crate::dialect::{MySql, Postgres, Sqlite};
use crate::expr::Expr;
use crate::qb;
use crate::value::Value;

fn pg() -> SqlCompiler {
    SqlCompiler::new(Arc::new(Postgres))
}

#[test]
fn test_compile_select() {
    let q = pg()
        .compile_select(&qb::select("users u").eq("u.id", 1))
        .unwrap();
    assert_eq!(q.sql(), r#"SELECT * FROM "users" AS "u" WHERE "u"."id" = $1"#);
    assert_eq!(q.params(), &[Value::Int(1)]);
}

#[test]
fn test_build_is_compile() {
    let draft = qb::select("users").eq("status", "active");
    let compiler = SqlCompiler::new(Arc::new(MySql));
    assert_eq!(draft.build(&compiler).unwrap(), compiler.compile(&draft).unwrap());
}

#[test]
fn test_compile_is_deterministic() {
    let draft = qb::select("users")
        .where_hash([("b", Value::from(2)), ("a", 1.into())])
        .in_list("c", [1, 2]);
    let a = pg().compile(&draft).unwrap();
    let b = pg().compile(&draft).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_each_statement_kind() {
    let c = SqlCompiler::new(Arc::new(Sqlite));
    assert_eq!(
        c.compile_insert(&qb::insert("t").set("a", 1)).unwrap().sql(),
        r#"INSERT INTO "t" ("a") VALUES (?)"#
    );
    assert_eq!(
        c.compile_upsert(&qb::upsert("t").set("a", 1).set("b", 2).on_conflict(["a"]))
            .unwrap()
            .sql(),
        r#"INSERT INTO "t" ("a", "b") VALUES (?, ?) ON CONFLICT ("a") DO UPDATE SET "b" = excluded."b""#
    );
    assert_eq!(
        c.compile_update(&qb::update("t").increment("n", 1).eq("id", 2))
            .unwrap()
            .sql(),
        r#"UPDATE "t" SET "n" = "n" + ? WHERE "id" = ?"#
    );
    assert_eq!(
        c.compile_delete(&qb::delete("t").eq("id", 2)).unwrap().sql(),
        r#"DELETE FROM "t" WHERE "id" = ?"#
    );
}

#[test]
fn test_placeholder_postcondition() {
    let draft = qb::select("users").where_raw("id = $1");
    let err = pg().compile(&draft).unwrap_err();
    assert_eq!(
        err,
        QbError::PlaceholderMismatch {
            placeholders: 1,
            params: 0
        }
    );

    let lenient = pg().with_config(CompilerConfig::new().verify_placeholders(false));
    assert_eq!(
        lenient.compile(&draft).unwrap().sql(),
        r#"SELECT * FROM "users" WHERE id = $1"#
    );
}

#[test]
fn test_quoted_question_marks_are_not_placeholders() {
    let c = SqlCompiler::new(Arc::new(MySql));
    let q = c
        .compile(&qb::select("faq").where_sql("title <> '?' AND id = ?", [3]))
        .unwrap();
    assert_eq!(q.sql(), "SELECT * FROM `faq` WHERE title <> '?' AND id = ?");
    assert_eq!(q.params(), &[Value::Int(3)]);
}

#[test]
fn test_template_argument_count_mismatch() {
    let err = pg()
        .compile(&qb::select("users").where_sql("a = ? AND b = ?", [1]))
        .unwrap_err();
    assert_eq!(
        err,
        QbError::PlaceholderMismatch {
            placeholders: 2,
            params: 1
        }
    );
}

#[test]
fn test_raw_list_argument_expands() {
    let q = pg()
        .compile(&qb::select("users").filter(Expr::template(
            "id IN (?) AND org = ?",
            [Value::from(vec![1i64, 2, 3]), Value::Int(9)],
        )))
        .unwrap();
    assert_eq!(
        q.sql(),
        r#"SELECT * FROM "users" WHERE id IN ($1, $2, $3) AND org = $4"#
    );
    assert_eq!(q.params().len(), 4);
}

#[test]
fn test_batch_insert_single_statement() {
    let draft = qb::batch_insert("events")
        .row([("kind", Value::from("a")), ("n", 1.into())])
        .row([("kind", Value::from("b")), ("n", 2.into())]);
    let q = pg().compile_batch_insert(&draft).unwrap();
    assert_eq!(
        q.sql(),
        r#"INSERT INTO "events" ("kind", "n") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(q.params().len(), 4);
}

#[test]
fn test_batch_insert_chunks_respect_param_budget() {
    let draft = qb::batch_insert("events").rows((0..5).map(|i| {
        [("kind", Value::from("k")), ("n", Value::Int(i))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }));
    let c = pg().with_config(CompilerConfig::new().max_params(4));
    let chunks = c.compile_batch_insert_chunks(&draft).unwrap();

    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks[0].sql(),
        r#"INSERT INTO "events" ("kind", "n") VALUES ($1, $2), ($3, $4)"#
    );
    assert_eq!(
        chunks[2].sql(),
        r#"INSERT INTO "events" ("kind", "n") VALUES ($1, $2)"#
    );
    assert_eq!(chunks[2].params(), &[Value::from("k"), Value::Int(4)]);
}

#[test]
fn test_batch_insert_chunks_budget_smaller_than_row() {
    let draft = qb::batch_insert("t")
        .row([("a", 1), ("b", 2), ("c", 3)])
        .row([("a", 4), ("b", 5), ("c", 6)]);
    let c = pg().with_config(CompilerConfig::new().max_params(1));
    assert_eq!(c.compile_batch_insert_chunks(&draft).unwrap().len(), 2);
}

#[test]
fn test_batch_insert_chunks_reports_global_row_index() {
    let mut draft = qb::batch_insert("t");
    for i in 0..4 {
        draft = draft.row([("a", i)]);
    }
    draft = draft.row([("b", 9)]);
    let c = pg().with_config(CompilerConfig::new().max_params(2));
    let err = c.compile_batch_insert_chunks(&draft).unwrap_err();
    assert!(matches!(err, QbError::ColumnMismatch { row: 4, .. }));
}

#[test]
fn test_batch_insert_empty() {
    let err = pg()
        .compile_batch_insert_chunks(&qb::batch_insert("t"))
        .unwrap_err();
    assert_eq!(err, QbError::EmptyBatch("batch insert"));
}

#[test]
fn test_batch_update() {
    let draft = qb::batch_update("users", ["id"])
        .row([("id", Value::from(1)), ("name", "a".into()), ("age", 30.into())])
        .row([("id", Value::from(2)), ("name", "b".into()), ("age", 31.into())]);
    let qs = pg().compile_batch_update(&draft).unwrap();

    assert_eq!(qs.len(), 2);
    assert_eq!(
        qs[0].sql(),
        r#"UPDATE "users" SET "age" = $1, "name" = $2 WHERE "id" = $3"#
    );
    assert_eq!(
        qs[1].params(),
        &[Value::Int(31), Value::Text("b".into()), Value::Int(2)]
    );
}

#[test]
fn test_batch_update_errors() {
    let c = pg();
    assert_eq!(
        c.compile_batch_update(&qb::batch_update("users", ["id"]))
            .unwrap_err(),
        QbError::EmptyBatch("batch update")
    );

    let missing = qb::batch_update("users", ["id"]).row([("name", "a")]);
    assert_eq!(
        c.compile_batch_update(&missing).unwrap_err(),
        QbError::MissingKey("id".into())
    );

    let keys_only = qb::batch_update("users", ["id"]).row([("id", 1)]);
    assert_eq!(
        c.compile_batch_update(&keys_only).unwrap_err(),
        QbError::EmptySet("users".into())
    );

    let list_key = qb::batch_update("t", ["id"]).row([
        ("id", crate::value::list([1, 2, 3])),
        ("name", Value::from("x")),
    ]);
    assert_eq!(
        c.compile_batch_update(&list_key).unwrap_err(),
        QbError::unsupported_value("batch update key 'id'", "list")
    );

    let null_key = qb::batch_update("t", ["id"])
        .row([("id", Value::Null), ("name", Value::from("x"))]);
    assert_eq!(
        c.compile_batch_update(&null_key).unwrap_err(),
        QbError::unsupported_value("batch update key 'id'", "null")
    );

    let no_keys = qb::batch_update("users", Vec::<String>::new()).row([("id", 1)]);
    assert!(matches!(
        c.compile_batch_update(&no_keys).unwrap_err(),
        QbError::MissingKey(_)
    ));
}

#[test]
fn test_for_driver() {
    let c = SqlCompiler::for_driver("PostgreSQL").unwrap();
    assert_eq!(c.dialect().name(), "postgres");
    assert!(SqlCompiler::for_driver("oracle").unwrap_err().is_unknown_dialect());
}

#[test]
fn test_compiled_query_parts() {
    let q = pg().compile(&qb::delete("t").eq("id", 5)).unwrap();
    assert_eq!(q.to_string(), q.sql());
    assert_eq!(q.cache_key(), q.sql());
    let (sql, params) = q.into_parts();
    assert_eq!(sql, r#"DELETE FROM "t" WHERE "id" = $1"#);
    assert_eq!(params, vec![Value::Int(5)]);
}
