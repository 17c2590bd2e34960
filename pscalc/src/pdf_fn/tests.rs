use super::*;
use crate::MachineError;
use assert_approx_eq::assert_approx_eq;
use rust_decimal_macros::dec;
use test_log::test;

#[test]
fn pdf_func() {
    // two-in, one-out
    let script = b"{ add }";
    let func = PdfFunc::new(script.as_slice(), 1);
    let r = func.exec(&[1.0, 2.0]).unwrap();
    assert_eq!(r, vec![3.0].into_boxed_slice());

    // two-in, two-out
    let script = b"{ sub 2 }";
    let func = PdfFunc::new(script.as_slice(), 2);
    let r = func.exec(&[1.0, 2.0]).unwrap();
    assert_eq!(r, vec![-1.0, 2.0].into_boxed_slice());
}

#[test]
fn tint_transform() {
    // one-in, four-out: gray to cmyk
    let func = PdfFunc::new(b"{ 0 0 0 4 -1 roll }".as_slice(), 4);
    let r = func.exec(&[0.25]).unwrap();
    assert_eq!(r, vec![0.0, 0.0, 0.0, 0.25].into_boxed_slice());
}

#[test]
fn spot_function() {
    let func = PdfFunc::new(b"{ dup mul exch dup mul add 1 exch sub }".as_slice(), 1);
    let r = func.exec(&[0.5, 0.5]).unwrap();
    assert_approx_eq!(r[0], 0.5);
}

#[test]
fn return_count_mismatch() {
    let func = PdfFunc::new(b"{ dup }".as_slice(), 1);
    let e = func.exec(&[1.0]).unwrap_err();
    assert_eq!(e.to_string(), "expected 1 return values, got 2");
}

#[test]
fn not_finite_argument() {
    let func = PdfFunc::new(b"{ }".as_slice(), 1);
    assert!(func.exec(&[f32::NAN]).is_err());
    assert!(func.exec(&[f32::INFINITY]).is_err());
}

#[test]
fn evaluation_error() {
    let func = PdfFunc::new(b"{ 0 div }".as_slice(), 1);
    let e = func.exec(&[1.0]).unwrap_err();
    let e = e.downcast::<Error>().unwrap();
    assert_eq!(e.kind(), &MachineError::DivisionByZero);
}

#[test]
fn decimal_eval() {
    let func = PdfFunc::new(b"{ 3 div }".as_slice(), 1)
        .with_options(Options::default().with_precision(4));
    assert_eq!(func.n_out(), 1);
    assert_eq!(func.eval(&[dec!(1)]), Ok(vec![dec!(0.3333)]));
}
