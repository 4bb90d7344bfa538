//! Values bound by object and array patterns

use integration_tests::{eval, uncaught};

#[test]
fn test_array_pattern_binds_in_order() {
    let realm = eval("var [a, b] = [1, 2]; let [, second, third] = [1, 2];").unwrap();
    assert_eq!(realm.inspect("a"), "1");
    assert_eq!(realm.inspect("b"), "2");
    assert_eq!(realm.inspect("second"), "2");
    assert_eq!(realm.inspect("third"), "undefined");
}

#[test]
fn test_defaults_apply_only_to_undefined() {
    let realm = eval("let [x = 1, y = 2, z = 3] = [undefined, 5, null];").unwrap();
    assert_eq!(realm.inspect("x"), "1");
    assert_eq!(realm.inspect("y"), "5");
    assert_eq!(realm.inspect("z"), "null");
}

#[test]
fn test_object_pattern_with_nested_targets() {
    let realm = eval("const {a, b: {c}, d: [e] = [9]} = {a: 1, b: {c: 2}};").unwrap();
    assert_eq!(realm.inspect("a"), "1");
    assert_eq!(realm.inspect("c"), "2");
    assert_eq!(realm.inspect("e"), "9");
}

#[test]
fn test_nested_pattern_default() {
    let realm = eval("var [{a} = {a: 3}] = []; var {p: {q} = {q: 5}} = {};").unwrap();
    assert_eq!(realm.inspect("a"), "3");
    assert_eq!(realm.inspect("q"), "5");
}

#[test]
fn test_object_rest_excludes_named_keys() {
    let realm = eval("let {a, ...r} = {a: 1, b: 2, c: 3};").unwrap();
    assert_eq!(realm.inspect("a"), "1");
    assert_eq!(realm.inspect("r"), "{b:2,c:3}");
}

#[test]
fn test_object_rest_excludes_computed_keys() {
    let realm = eval("let k = 'b'; let {[k]: v, 'a': w, ...r} = {a: 1, b: 2, c: 3};").unwrap();
    assert_eq!(realm.inspect("v"), "2");
    assert_eq!(realm.inspect("w"), "1");
    assert_eq!(realm.inspect("r"), "{c:3}");
}

#[test]
fn test_array_rest_collects_remainder() {
    let realm = eval("let [h, ...t] = [1, 2, 3]; let [...all] = 'ab';").unwrap();
    assert_eq!(realm.inspect("h"), "1");
    assert_eq!(realm.inspect("t"), "[2,3]");
    assert_eq!(realm.inspect("all"), "[\"a\",\"b\"]");
}

#[test]
fn test_assignment_patterns() {
    let realm = eval("var a = 1, b = 2; [a, b] = [b, a];").unwrap();
    assert_eq!(realm.inspect("a"), "2");
    assert_eq!(realm.inspect("b"), "1");

    let realm = eval("var o = {}; [o.p, o['q']] = [1, 2]; ({a: o.x, ...o.rest} = {a: 1, b: 2});")
        .unwrap();
    assert_eq!(realm.inspect("o"), "{p:1,q:2,x:1,rest:{b:2}}");
}

#[test]
fn test_assignment_expression_value_is_source() {
    let realm = eval("var a, b; var r = [a, b] = [7, 8];").unwrap();
    assert_eq!(realm.inspect("r"), "[7,8]");
    assert_eq!(realm.inspect("a"), "7");
}

#[test]
fn test_catch_parameter_pattern() {
    let realm = eval("var got; try { throw {code: 7, extra: 1}; } catch ({code}) { got = code; }")
        .unwrap();
    assert_eq!(realm.inspect("got"), "7");
}

#[test]
fn test_destructuring_errors() {
    assert_eq!(uncaught("let {a} = null;"), "TypeError: cannot convert null to object");
    assert_eq!(uncaught("var [a] = 1;"), "TypeError: 1 is not iterable");
}

#[test]
fn test_super_targets_store_on_the_receiver() {
    let realm = eval(
        "var k = 'b';
         var o = { m(src) { ({a: super.x, [k]: super[k], ...super.r} = src); } };
         o.m({a: 1, b: 2, c: 3, d: 4});",
    )
    .unwrap();
    assert_eq!(realm.inspect("o"), "{m:function,x:1,b:2,r:{c:3,d:4}}");
}

#[test]
fn test_super_reads_through_the_home_prototype() {
    let realm = eval(
        "var base = {greet: 'hi', n: 1};
         var o = set_prototype({ m() { var {length: l} = super.greet, [first] = [super['n']]; return [l, first]; } }, base);
         var r = o.m();",
    )
    .unwrap();
    assert_eq!(realm.inspect("r"), "[2,1]");
}

#[test]
fn test_super_store_without_prototype_throws() {
    let message = uncaught(
        "var o = set_prototype({ m() { [super.x] = [1]; } }, null);
         o.m();",
    );
    assert_eq!(message, "TypeError: cannot set property 'x' of null");
}

#[test]
fn test_anonymous_functions_take_binding_names() {
    let realm = eval(
        "var f = function () {};
         let {g = function () {}} = {};
         var [h = function () {}] = [];
         var named = function inner() {};
         var names = [f.name, g.name, h.name, named.name];",
    )
    .unwrap();
    assert_eq!(realm.inspect("names"), "[\"f\",\"g\",\"h\",\"inner\"]");
}
