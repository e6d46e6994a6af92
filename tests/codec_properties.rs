use rand::rngs::StdRng;
use rand::SeedableRng;
use tradegene::engines::generation::codec::{decode_clauses, scale_factor};
use tradegene::engines::generation::{
    decode, encode, mutate, new_gene, Clause, Combinator, Expr, Gene, Operand, Operator, Term,
    RECORD_WIDTH,
};

#[test]
fn test_decode_is_total_and_stop_loss_bounded() {
    let mut rng = StdRng::seed_from_u64(42);
    for records in 1..=8 {
        for _ in 0..50 {
            let rule = decode(&new_gene(records, &mut rng));
            assert!((0.85..=1.0).contains(&rule.stop_loss), "{}", rule.stop_loss);
            // evaluation never panics, whatever the row width
            let empty: &[f64] = &[];
            rule.evaluate(&[1.0, 2.0, 3.0][..]);
            rule.evaluate(empty);
        }
    }
}

#[test]
fn test_odd_lengths_decode() {
    for len in [0, 1, 2, 39, 41, 79] {
        let rule = decode(&Gene::from_bits(vec![true; len]));
        assert!((0.85..=1.0).contains(&rule.stop_loss));
    }
}

#[test]
fn test_no_enabled_clauses_is_constant_false() {
    let rule = decode(&Gene::from_bits(vec![false; 3 * RECORD_WIDTH]));
    assert!(rule.is_constant_false());
    assert_eq!(rule.expr, Expr::Literal(false));
    assert_eq!(rule.stop_loss, 1.0);
    assert!(!rule.evaluate(&[5.0][..]));
}

#[test]
fn test_operator_codes() {
    assert_eq!(Operator::from_code(0b00), Operator::Eq);
    assert_eq!(Operator::from_code(0b01), Operator::Ne);
    assert_eq!(Operator::from_code(0b10), Operator::Gt);
    assert_eq!(Operator::from_code(0b11), Operator::Lt);
}

#[test]
fn test_scale_factor_range() {
    assert_eq!(scale_factor(0), -1.0);
    assert!((scale_factor(127) - 0.9997).abs() < 1e-3);
    assert!(scale_factor(63).abs() < 0.01);
    assert!(scale_factor(64).abs() < 0.01);
}

#[test]
fn test_encoded_clauses_decode_back() {
    let clauses = vec![
        Clause {
            left: Term {
                operand: Operand::Reference(3),
                scale: Some(100),
            },
            operator: Operator::Gt,
            right: Term {
                operand: Operand::Literal(42),
                scale: None,
            },
            combinator: Combinator::And,
            stop_loss_raw: 7,
        },
        Clause {
            left: Term {
                operand: Operand::Reference(0),
                scale: None,
            },
            operator: Operator::Lt,
            right: Term {
                operand: Operand::Reference(1),
                scale: Some(0),
            },
            combinator: Combinator::Or,
            stop_loss_raw: 12,
        },
    ];
    let gene = encode(&clauses);
    assert_eq!(gene.len(), 2 * RECORD_WIDTH);
    assert_eq!(decode_clauses(&gene), clauses);
    assert!((decode(&gene).stop_loss - 0.88).abs() < 1e-12);
}

#[test]
fn test_mutation_extremes() {
    let mut rng = StdRng::seed_from_u64(7);
    let gene = new_gene(4, &mut rng);

    assert_eq!(mutate(&gene, 0.0, &mut rng), gene);

    let flipped = mutate(&gene, 1.0, &mut rng);
    assert_eq!(flipped.len(), gene.len());
    assert!(flipped.bits().iter().zip(gene.bits()).all(|(a, b)| a != b));
}
