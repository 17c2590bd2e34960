use assert_approx_eq::assert_approx_eq;
use num_traits::ToPrimitive;
use pscalc::{eval, eval_with, Decimal, Error, Machine, MachineError, Options, PdfFunc, Value};
use rust_decimal_macros::dec;
use static_assertions::assert_impl_all;
use test_case::test_case;

assert_impl_all!(Machine: Send, Sync);
assert_impl_all!(PdfFunc: Send, Sync);
assert_impl_all!(Error: Send, Sync, std::error::Error);
assert_impl_all!(Value: Send, Sync, Copy);

fn to_f64(r: &[Decimal]) -> Vec<f64> {
    r.iter().map(|d| d.to_f64().unwrap()).collect()
}

fn assert_approx(r: &[Decimal], exp: &[f64]) {
    let r = to_f64(r);
    assert_eq!(r.len(), exp.len(), "{:?} vs {:?}", r, exp);
    for (a, b) in r.iter().zip(exp) {
        assert_approx_eq!(*a, *b, 1e-5);
    }
}

#[test_log::test]
fn halftone_spot_function() {
    // operands are in degrees: sin(144) / 2 + sin(180) / 2. Evaluators that
    // convert the angle twice (treating degrees as radians and converting
    // back) report 0.633811 here, deliberately not reproduced.
    let r = eval(
        "{ 360 mul sin 2 div exch 360 mul sin 2 div add }",
        &[dec!(0.5), dec!(0.4)],
    )
    .unwrap();
    assert_approx(&r, &[0.293_892_6]);
}

#[test_case("1 2 add 3 mul" => vec![dec!(9)])]
#[test_case("5 2 idiv" => vec![dec!(2)])]
#[test_case("5 2 mod" => vec![dec!(1)])]
#[test_case("-5 2 mod" => vec![dec!(-1)])]
#[test_case("90 sin" => vec![dec!(1)])]
#[test_case("0 cos" => vec![dec!(1)])]
#[test_case("180 cos" => vec![dec!(-1)])]
#[test_case("2 3 exp" => vec![dec!(8)])]
#[test_case("1 2 3 3 copy" => vec![dec!(1), dec!(2), dec!(3), dec!(1), dec!(2), dec!(3)])]
#[test_case("1 2 3 4 5 3 2 roll" => vec![dec!(1), dec!(2), dec!(4), dec!(5), dec!(3)])]
fn exact_scenarios(program: &str) -> Vec<Decimal> {
    eval(program, &[]).unwrap()
}

#[test]
fn logarithms() {
    assert_approx(&eval("100 log", &[]).unwrap(), &[2.0]);
    assert_approx(&eval("1 ln", &[]).unwrap(), &[0.0]);
}

#[test]
fn boolean_results() {
    assert_eq!(
        eval("true false and", &[]),
        Err(Error::Machine(MachineError::NonNumericOutput { position: 0 }))
    );
    assert_eq!(eval("true false and pop", &[dec!(1)]), Ok(vec![dec!(1)]));
    assert_eq!(
        eval("true", &[]).unwrap_err().kind(),
        &MachineError::NonNumericOutput { position: 0 }
    );
}

#[test]
fn boundary_errors() {
    let e = eval("div", &[dec!(1), dec!(0)]).unwrap_err();
    assert_eq!(e.kind(), &MachineError::DivisionByZero);
    assert_eq!(e.operator(), Some("div"));

    let e = eval("sqrt", &[dec!(-1)]).unwrap_err();
    assert_eq!(e.kind(), &MachineError::DomainError);

    let e = eval("add", &[dec!(1)]).unwrap_err();
    assert_eq!(e.kind(), &MachineError::StackUnderflow);

    let e = eval("true 1 add", &[]).unwrap_err();
    assert!(matches!(e.kind(), MachineError::TypeMismatch { .. }));

    let e = eval("foo", &[]).unwrap_err();
    assert_eq!(e.kind(), &MachineError::UnknownOperator("foo".to_owned()));
    assert_eq!(e.operator(), None);
}

#[test]
fn initial_stack_overflow() {
    let options = Options::default().with_max_stack_depth(1);
    assert_eq!(
        eval_with("", &[dec!(1), dec!(2)], &options),
        Err(Error::Machine(MachineError::StackOverflow))
    );
}

const STACKS: [&[Decimal]; 4] = [
    &[dec!(1)],
    &[dec!(0.5), dec!(-2)],
    &[dec!(3), dec!(1.25), dec!(-7.5)],
    &[dec!(0), dec!(0), dec!(0), dec!(100)],
];

const PROGRAMS: [&str; 5] = [
    "dup mul",
    "neg 2 add",
    "dup 0 gt pop",
    "360 mul cos",
    "abs sqrt 1 exch sub",
];

#[test]
fn purity() {
    for p in PROGRAMS {
        for s in STACKS {
            assert_eq!(eval(p, s), eval(p, s));
        }
    }
}

#[test]
fn empty_program_is_identity() {
    for s in STACKS {
        assert_eq!(eval("", s).unwrap(), s);
    }
}

#[test]
fn white_space_and_brackets_insensitive() {
    for p in PROGRAMS {
        let spaced = p.replace(' ', " \t\n ");
        let wrapped = format!("{{ {p} }}");
        for s in STACKS {
            let r = eval(p, s);
            assert_eq!(eval(&spaced, s), r);
            assert_eq!(eval(&wrapped, s), r);
        }
    }
}

#[test]
fn inverse_pairs() {
    for s in STACKS {
        assert_eq!(eval("dup pop", s).unwrap(), s);
        assert_eq!(eval("neg neg", s).unwrap().last(), s.last());
        if s.len() >= 2 {
            assert_eq!(eval("exch exch", s).unwrap(), s);
        }
    }

    let mut m = Machine::new(Options::default());
    m.execute(b"true not false not").unwrap();
    assert_eq!(m.stack(), &[Value::from(false), Value::from(true)]);
}

#[test]
fn division_round_trip() {
    let pairs = [
        (dec!(1), dec!(3)),
        (dec!(-2), dec!(7)),
        (dec!(10), dec!(0.3)),
        (dec!(123.456), dec!(-0.001)),
    ];
    for (x, y) in pairs {
        let q = eval("div", &[x, y]).unwrap()[0];
        let back = q * y;
        assert!((back - x).abs() < dec!(0.000000000000000001), "{x} / {y}");
    }
}

#[test]
fn pdf_func_wraps_eval() {
    let func = PdfFunc::new(b"{ 360 mul sin }".as_slice(), 1);
    let r = func.exec(&[0.25]).unwrap();
    assert_approx_eq!(r[0], 1.0);
}
