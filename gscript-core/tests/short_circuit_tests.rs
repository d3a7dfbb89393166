//! 短路求值测试

mod common;
use common::{flag, number, run_code};

#[test]
fn test_and_short_circuit_false() {
    // 左边为假时右边的自增不会执行
    let ctx = run_code("x = 0; r = x && y++;").unwrap();
    // 结果写入数字存储
    assert_eq!(number(&ctx, "r"), Some(0.0));
    assert_eq!(flag(&ctx, "r"), None);
    assert_eq!(number(&ctx, "y"), None);
}

#[test]
fn test_and_evaluates_right() {
    // c++ 的值是自增前的 0，所以结果为假，但副作用发生了
    let ctx = run_code("c = 0; r = 1 && c++;").unwrap();
    assert_eq!(number(&ctx, "c"), Some(1.0));
    assert_eq!(number(&ctx, "r"), Some(0.0));
}

#[test]
fn test_or_short_circuit_true() {
    let ctx = run_code("c = 0; r = 1 || c++;").unwrap();
    assert_eq!(number(&ctx, "r"), Some(1.0));
    assert_eq!(number(&ctx, "c"), Some(0.0));
}

#[test]
fn test_or_evaluates_right() {
    let ctx = run_code("c = 0; r = 0 || ++c;").unwrap();
    assert_eq!(number(&ctx, "c"), Some(1.0));
    assert_eq!(number(&ctx, "r"), Some(1.0));
}

#[test]
fn test_short_circuit_in_condition() {
    let code = r#"
        n = 0;
        hits = 0;
        while (n < 4 && ++hits) {
            n++;
        }
    "#;
    let ctx = run_code(code).unwrap();
    assert_eq!(number(&ctx, "n"), Some(4.0));
    // 最后一次条件在左边就失败
    assert_eq!(number(&ctx, "hits"), Some(4.0));
}

#[test]
fn test_not_of_conjunction() {
    let ctx = run_code("a = !(1 && 0); b = !(0 || 0); c = !1 || 1;").unwrap();
    // ! 产生标志，|| 产生数字
    assert_eq!(flag(&ctx, "a"), Some(true));
    assert_eq!(flag(&ctx, "b"), Some(true));
    assert_eq!(number(&ctx, "c"), Some(1.0));
    assert_eq!(flag(&ctx, "c"), None);
}
