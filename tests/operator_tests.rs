//! Operator integration tests
//!
//! End-to-end scenarios driving multi-operator trees through the public API.

use rowmill::{
    AggregateSpec, CompareOp, Executor, ExecutorError, Filter, HashAggregate, HashJoin, Predicate,
    Print, Project, Register, Row, SetOp, SetOpKind, Sort, SortKey, Values,
};

fn int_row(v: i64) -> Row {
    Row::new(vec![Register::from_int(v)])
}

fn rows_of(pairs: &[(i64, &str)]) -> Vec<Row> {
    pairs
        .iter()
        .map(|&(i, s)| Row::new(vec![Register::from_int(i), Register::from_string(s)]))
        .collect()
}

async fn drain(exec: &mut dyn Executor) -> Vec<Row> {
    let mut out = Vec::new();
    while let Some(row) = exec.next().await.unwrap() {
        out.push(row);
    }
    out
}

// ============ Printed scenarios ============

#[tokio::test]
async fn test_projection_then_print() {
    // Input [(1,"a"), (2,"b")] projected to [1,0]
    let source = Box::new(Values::new(rows_of(&[(1, "a"), (2, "b")])));
    let project = Box::new(Project::new(source, vec![1, 0]));

    let mut print = Print::new(project, Vec::new());
    print.open().await.unwrap();
    print.run().await.unwrap();
    print.close().await.unwrap();

    let out = String::from_utf8(print.into_writer()).unwrap();
    assert_eq!(out, "a,1\nb,2\n");
}

#[tokio::test]
async fn test_filter_ne_then_print() {
    let source = Box::new(Values::new(vec![
        int_row(1),
        int_row(2),
        int_row(3),
        int_row(2),
        int_row(1),
    ]));
    let filter = Box::new(Filter::new(
        source,
        Predicate::IntConst {
            attr_index: 0,
            op: CompareOp::Ne,
            value: 2,
        },
    ));

    let mut print = Print::new(filter, Vec::new());
    print.open().await.unwrap();
    print.run().await.unwrap();
    print.close().await.unwrap();

    let out = String::from_utf8(print.into_writer()).unwrap();
    assert_eq!(out, "1\n3\n1\n");
}

// ============ Sort ============

#[tokio::test]
async fn test_sort_two_keys_desc_asc() {
    // (grade, name) by grade desc then name asc
    let source = Box::new(Values::new(rows_of(&[
        (2, "b"),
        (1, "c"),
        (2, "a"),
        (1, "b"),
    ])));

    let mut sort = Sort::new(source, vec![SortKey::desc(0), SortKey::asc(1)]);
    sort.open().await.unwrap();

    let out: Vec<(i64, String)> = drain(&mut sort)
        .await
        .iter()
        .map(|r| {
            (
                r.get(0).unwrap().as_int().unwrap(),
                r.get(1).unwrap().as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        out,
        vec![
            (2, "a".to_string()),
            (2, "b".to_string()),
            (1, "b".to_string()),
            (1, "c".to_string()),
        ]
    );

    sort.close().await.unwrap();
}

#[tokio::test]
async fn test_sort_is_idempotent() {
    // Sorting already-sorted input leaves it unchanged (stability)
    let rows = rows_of(&[(1, "x"), (1, "y"), (2, "z")]);

    let mut first = Sort::new(
        Box::new(Values::new(rows.clone())),
        vec![SortKey::asc(0)],
    );
    first.open().await.unwrap();
    let once = drain(&mut first).await;
    first.close().await.unwrap();

    let mut second = Sort::new(Box::new(Values::new(once.clone())), vec![SortKey::asc(0)]);
    second.open().await.unwrap();
    let twice = drain(&mut second).await;
    second.close().await.unwrap();

    assert_eq!(once, twice);
}

// ============ Aggregation ============

#[tokio::test]
async fn test_group_by_dept_sum_count() {
    // (dept, amount): x -> (45, 3), y -> (60, 2), ascending dept order
    let source = Box::new(Values::new(vec![
        Row::new(vec![Register::from_string("x"), Register::from_int(10)]),
        Row::new(vec![Register::from_string("y"), Register::from_int(20)]),
        Row::new(vec![Register::from_string("x"), Register::from_int(30)]),
        Row::new(vec![Register::from_string("y"), Register::from_int(40)]),
        Row::new(vec![Register::from_string("x"), Register::from_int(5)]),
    ]));

    let agg = Box::new(HashAggregate::new(
        source,
        vec![0],
        vec![AggregateSpec::sum(1), AggregateSpec::count(1)],
    ));

    let mut print = Print::new(agg, Vec::new());
    print.open().await.unwrap();
    print.run().await.unwrap();
    print.close().await.unwrap();

    let out = String::from_utf8(print.into_writer()).unwrap();
    assert_eq!(out, "x,45,3\ny,60,2\n");
}

#[tokio::test]
async fn test_sum_count_identical_rows() {
    // n identical rows of value v: SUM = n*v, COUNT = n
    let n = 7;
    let v = 13;
    let source = Box::new(Values::new(vec![int_row(v); n]));

    let mut agg = HashAggregate::new(
        source,
        vec![],
        vec![AggregateSpec::sum(0), AggregateSpec::count(0)],
    );
    agg.open().await.unwrap();

    let out = drain(&mut agg).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get(0).unwrap().as_int(), Some(n as i64 * v));
    assert_eq!(out[0].get(1).unwrap().as_int(), Some(n as i64));

    agg.close().await.unwrap();
}

// ============ Join ============

#[tokio::test]
async fn test_hash_join_inner() {
    // Left (id, name), right (id, city), joined on id
    let left = Box::new(Values::new(rows_of(&[(1, "a"), (2, "b"), (1, "c")])));
    let right = Box::new(Values::new(rows_of(&[(1, "P"), (3, "Q"), (1, "R")])));

    let join = Box::new(HashJoin::new(left, right, 0, 0));

    let mut print = Print::new(join, Vec::new());
    print.open().await.unwrap();
    print.run().await.unwrap();
    print.close().await.unwrap();

    let out = String::from_utf8(print.into_writer()).unwrap();
    assert_eq!(out, "1,a,1,P\n1,a,1,R\n1,c,1,P\n1,c,1,R\n");
}

#[tokio::test]
async fn test_join_above_filter() {
    // Filter the probe side before joining
    let left = Box::new(Values::new(rows_of(&[(1, "keep"), (2, "drop"), (3, "keep")])));
    let filtered = Box::new(Filter::new(
        left,
        Predicate::IntConst {
            attr_index: 0,
            op: CompareOp::Ne,
            value: 2,
        },
    ));
    let right = Box::new(Values::new(rows_of(&[(1, "P"), (2, "Q"), (3, "R")])));

    let mut join = HashJoin::new(filtered, right, 0, 0);
    join.open().await.unwrap();

    let out = drain(&mut join).await;
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get(3).unwrap().as_str(), Some("P"));
    assert_eq!(out[1].get(3).unwrap().as_str(), Some("R"));

    join.close().await.unwrap();
}

// ============ Set algebra ============

async fn run_set_op(kind: SetOpKind, left: &[i64], right: &[i64]) -> Vec<i64> {
    let left = Box::new(Values::new(left.iter().copied().map(int_row).collect()));
    let right = Box::new(Values::new(right.iter().copied().map(int_row).collect()));

    let mut op = SetOp::new(kind, left, right);
    op.open().await.unwrap();
    let out = drain(&mut op)
        .await
        .iter()
        .map(|r| r.get(0).unwrap().as_int().unwrap())
        .collect();
    op.close().await.unwrap();
    out
}

#[tokio::test]
async fn test_multiset_algebra() {
    // L = [a,a,a,b,c], R = [a,b,b] with a=1, b=2, c=3
    let l = [1, 1, 1, 2, 3];
    let r = [1, 2, 2];

    assert_eq!(run_set_op(SetOpKind::Union, &l, &r).await, vec![1, 2, 3]);
    assert_eq!(
        run_set_op(SetOpKind::UnionAll, &l, &r).await,
        vec![1, 1, 1, 1, 2, 2, 2, 3]
    );
    assert_eq!(run_set_op(SetOpKind::Intersect, &l, &r).await, vec![1, 2]);
    assert_eq!(
        run_set_op(SetOpKind::IntersectAll, &l, &r).await,
        vec![1, 2]
    );
    assert_eq!(run_set_op(SetOpKind::Except, &l, &r).await, vec![3]);
    assert_eq!(run_set_op(SetOpKind::ExceptAll, &l, &r).await, vec![1, 1, 3]);
}

#[tokio::test]
async fn test_set_op_over_operator_trees() {
    // UNION ALL of two sorted/filtered subtrees, then aggregated
    let left = Box::new(Filter::new(
        Box::new(Values::new(vec![int_row(1), int_row(2), int_row(3)])),
        Predicate::IntConst {
            attr_index: 0,
            op: CompareOp::Lt,
            value: 3,
        },
    ));
    let right = Box::new(Values::new(vec![int_row(2), int_row(4)]));

    let union = Box::new(SetOp::union_all(left, right));
    let mut agg = HashAggregate::new(union, vec![], vec![AggregateSpec::count(0)]);
    agg.open().await.unwrap();

    let out = drain(&mut agg).await;
    assert_eq!(out[0].get(0).unwrap().as_int(), Some(4));

    agg.close().await.unwrap();
}

// ============ Contract edges ============

#[tokio::test]
async fn test_eof_is_sticky_across_operators() {
    let source = Box::new(Values::new(vec![int_row(1)]));
    let mut project = Project::new(source, vec![0]);
    project.open().await.unwrap();

    assert!(project.next().await.unwrap().is_some());
    assert!(project.next().await.unwrap().is_none());
    assert!(project.next().await.unwrap().is_none());

    project.close().await.unwrap();
}

#[tokio::test]
async fn test_close_after_error() {
    let source = Box::new(Values::new(vec![Row::new(vec![Register::from_string(
        "oops",
    )])]));
    let mut filter = Filter::new(
        source,
        Predicate::IntConst {
            attr_index: 0,
            op: CompareOp::Eq,
            value: 1,
        },
    );
    filter.open().await.unwrap();

    assert!(matches!(
        filter.next().await,
        Err(ExecutorError::TypeMismatch { .. })
    ));
    // A tree that has errored must still close cleanly
    filter.close().await.unwrap();
}

#[tokio::test]
async fn test_select_cardinality_split() {
    // count(input) = count(emitted) + count(rejected)
    let input: Vec<i64> = vec![5, 1, 5, 2, 5, 3];
    let total = input.len();

    let emitted = {
        let source = Box::new(Values::new(input.iter().copied().map(int_row).collect()));
        let mut f = Filter::new(
            source,
            Predicate::IntConst {
                attr_index: 0,
                op: CompareOp::Eq,
                value: 5,
            },
        );
        f.open().await.unwrap();
        let n = drain(&mut f).await.len();
        f.close().await.unwrap();
        n
    };
    let rejected = {
        let source = Box::new(Values::new(input.iter().copied().map(int_row).collect()));
        let mut f = Filter::new(
            source,
            Predicate::IntConst {
                attr_index: 0,
                op: CompareOp::Ne,
                value: 5,
            },
        );
        f.open().await.unwrap();
        let n = drain(&mut f).await.len();
        f.close().await.unwrap();
        n
    };

    assert_eq!(emitted + rejected, total);
}
