//! Exhaustive checks of the flat expansion against ripple carry.

use carry_expand::{
    decode_term, pack_lanes, ripple_carries, term_count, CarryVectorBuilder, Factor, Netlist,
    NetlistSimulator, TermEnumerator, Terminal,
};

/// Every (a, b, cin) for `width`, packed 64 vectors per batch.
fn exhaustive_batches(width: usize) -> Vec<(Vec<u64>, Vec<u64>, u64)> {
    let mask = (1u64 << width) - 1;
    let total = 1u64 << (2 * width + 1);
    let mut batches = Vec::new();

    let mut start = 0;
    while start < total {
        let end = (start + 64).min(total);
        let mut a_vals = Vec::new();
        let mut b_vals = Vec::new();
        let mut cin = 0u64;
        for (lane, v) in (start..end).enumerate() {
            a_vals.push(v & mask);
            b_vals.push((v >> width) & mask);
            cin |= (v >> (2 * width)) << lane;
        }
        batches.push((pack_lanes(&a_vals, width), pack_lanes(&b_vals, width), cin));
        start = end;
    }
    batches
}

#[test]
fn enumerator_matches_ripple_exhaustively() {
    for width in 0..=6 {
        let e = TermEnumerator::new(width).unwrap();
        for (a, b, cin) in exhaustive_batches(width) {
            let r = e.evaluate(&a, &b, cin).unwrap();
            assert_eq!(r.carry, ripple_carries(&a, &b, cin)[width], "width {}", width);
        }
    }
}

#[test]
fn builder_matches_ripple_exhaustively() {
    for width in 1..=6 {
        let builder = CarryVectorBuilder::with_width(width).unwrap();
        for (a, b, cin) in exhaustive_batches(width) {
            let v = builder.build(&a, &b, cin).unwrap();
            assert_eq!(v.carry.len(), width + 1);
            assert_eq!(v.generate.len(), width);
            assert!(v.matches_ripple(&a, &b, cin), "width {}", width);
            for k in 0..width {
                assert_eq!(v.generate[k], a[k] & b[k]);
            }
        }
    }
}

#[test]
fn carry_in_passes_through() {
    let builder = CarryVectorBuilder::with_width(3).unwrap();
    for cin in [0u64, u64::MAX, 0xA5A5] {
        let v = builder.build(&[0, 0, 0], &[0, 0, 0], cin).unwrap();
        assert_eq!(v.carry[0], cin);
    }
}

#[test]
fn carry_in_is_monotonic() {
    // Raising cin never lowers any carry for fixed operands.
    for width in 1..=5 {
        let builder = CarryVectorBuilder::with_width(width).unwrap();
        for (a, b, _) in exhaustive_batches(width) {
            let lo = builder.build(&a, &b, 0).unwrap();
            let hi = builder.build(&a, &b, u64::MAX).unwrap();
            for k in 0..=width {
                assert_eq!(lo.carry[k] & !hi.carry[k], 0);
            }
        }
    }
}

#[test]
fn term_structure_per_width() {
    for width in 0..=10 {
        let e = TermEnumerator::new(width).unwrap();
        assert_eq!(e.terms().len() as u64, term_count(width));

        let mut generate_terms = 0;
        for (_, term) in e.terms() {
            match term.terminal() {
                Some(Terminal::CarryIn) => {
                    assert!(!term.factors()[..term.len() - 1].contains(&Factor::CarryIn));
                }
                Some(Terminal::Generate { .. }) => generate_terms += 1,
                None => panic!("non-terminal term {}", term),
            }
        }
        // One generate term per position, reached through 0/1 digits above it.
        let expected: u64 = (0..width).map(|i| 1u64 << (width - 1 - i)).sum();
        assert_eq!(generate_terms, expected);
    }
}

#[test]
fn generate_bit_ignores_lower_bits_and_carry_in() {
    let e = TermEnumerator::new(4).unwrap();
    let idx = e.generate_index().unwrap();
    assert_eq!(decode_term(4, idx).unwrap().factors(), &[Factor::A(3), Factor::B(3)]);

    let a = [u64::MAX, 0, u64::MAX, 0b1100];
    let b = [0, u64::MAX, u64::MAX, 0b1010];
    for cin in [0, u64::MAX] {
        assert_eq!(e.evaluate(&a, &b, cin).unwrap().generate, Some(0b1000));
    }
}

#[test]
fn scenario_two_bits() {
    let builder = CarryVectorBuilder::with_width(2).unwrap();
    let v = builder.build(&[0, 1], &[1, 0], 1).unwrap();
    assert_eq!(v.carry, vec![1, 1, 1]);
    assert_eq!(v.generate, vec![0, 0]);
}

#[test]
fn scenario_three_bits() {
    // A=110, B=011, cin=0
    let a = [0, 1, 1];
    let b = [1, 1, 0];
    let builder = CarryVectorBuilder::with_width(3).unwrap();
    let v = builder.build(&a, &b, 0).unwrap();
    assert_eq!(v.carry, ripple_carries(&a, &b, 0));
    assert_eq!(v.carry, vec![0, 0, 1, 1]);
    assert_eq!(v.generate, vec![0, 1, 0]);
}

#[test]
fn exported_netlist_simulates_exhaustively() {
    for width in 1..=4 {
        let mut sim = NetlistSimulator::new(Netlist::from_width(width).unwrap(), 64).unwrap();
        let builder = CarryVectorBuilder::with_width(width).unwrap();
        for (a, b, cin) in exhaustive_batches(width) {
            sim.reset();
            sim.poke("a", &a).unwrap();
            sim.poke("b", &b).unwrap();
            sim.poke("cin", &[cin]).unwrap();
            sim.evaluate();

            let v = builder.build(&a, &b, cin).unwrap();
            assert_eq!(sim.peek("carry").unwrap(), v.carry);
            assert_eq!(sim.peek("generate").unwrap(), v.generate);
        }
    }
}
