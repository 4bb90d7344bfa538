//! Iterator records opened by array patterns are closed exactly when the
//! pattern stops before the iterator is exhausted.

use integration_tests::{eval, IteratorStats};

fn stats(source: &str) -> IteratorStats {
    eval(source).unwrap().stats()
}

#[test]
fn test_unfinished_iterator_is_closed() {
    assert_eq!(
        stats("var [a] = tracked([1, 2, 3]);"),
        IteratorStats { steps: 1, closed: 1 }
    );
}

#[test]
fn test_empty_pattern_closes_without_stepping() {
    assert_eq!(stats("var [] = tracked([1]);"), IteratorStats { steps: 0, closed: 1 });
}

#[test]
fn test_rest_exhausts_iterator() {
    let realm = eval("var [a, ...r] = tracked([1, 2]);").unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 3, closed: 0 });
    assert_eq!(realm.inspect("r"), "[2]");
}

#[test]
fn test_elisions_step_the_iterator() {
    let realm = eval("var [, , z] = tracked([1, 2]);").unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 3, closed: 0 });
    assert_eq!(realm.inspect("z"), "undefined");
}

#[test]
fn test_nested_iterator_closed_independently() {
    let realm = eval("var [[x], y] = [tracked([1, 2]), 2];").unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 1, closed: 1 });
    assert_eq!(realm.inspect("x"), "1");
    assert_eq!(realm.inspect("y"), "2");
}

#[test]
fn test_exception_in_default_closes_iterator() {
    let realm = eval(
        "function boom() { throw 'x'; }
         var caught;
         try { var [a = boom()] = tracked([undefined, 1]); } catch (e) { caught = e; }",
    )
    .unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 1, closed: 1 });
    assert_eq!(realm.inspect("caught"), "\"x\"");
}

#[test]
fn test_generator_return_closes_pending_iterator() {
    let realm = eval(
        "function* g() { var [a = yield] = tracked([undefined, 1]); }
         var it = g();
         var first = it.next();
         var last = it.return(5);
         var after = it.next();",
    )
    .unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 1, closed: 1 });
    assert_eq!(realm.inspect("first"), "{value:undefined,done:false}");
    assert_eq!(realm.inspect("last"), "{value:5,done:true}");
    assert_eq!(realm.inspect("after"), "{value:undefined,done:true}");
}

#[test]
fn test_generator_return_closes_every_open_record() {
    let realm = eval(
        "function* g() { var [[x = yield], y] = tracked([tracked([undefined]), 2]); }
         var it = g();
         it.next();
         it.return();",
    )
    .unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 2, closed: 2 });
}

#[test]
fn test_generator_resumed_value_feeds_the_default() {
    let realm = eval(
        "function* g() { var [a = yield 'need', b] = tracked([undefined, 2]); return a + b; }
         var it = g();
         var first = it.next();
         var second = it.next(40);",
    )
    .unwrap();
    assert_eq!(realm.inspect("first"), "{value:\"need\",done:false}");
    assert_eq!(realm.inspect("second"), "{value:42,done:true}");
    assert_eq!(realm.stats(), IteratorStats { steps: 2, closed: 1 });
}

#[test]
fn test_generator_return_before_start_runs_nothing() {
    let realm = eval(
        "function* g() { var [a] = tracked([1]); }
         var it = g();
         var r = it.return(3);",
    )
    .unwrap();
    assert_eq!(realm.stats(), IteratorStats { steps: 0, closed: 0 });
    assert_eq!(realm.inspect("r"), "{value:3,done:true}");
}
