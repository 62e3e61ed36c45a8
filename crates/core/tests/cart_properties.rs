//! Property-based invariant tests for the cart store.
//!
//! Verifies:
//! 1. Repeated adds: one line per distinct id, quantity = occurrence count,
//!    lines ordered by first occurrence
//! 2. `update_quantity(id, 0)` and `remove_item(id)` produce the same state
//! 3. `total()` equals Σ price × quantity recomputed from the lines, after any
//!    mutation sequence
//! 4. Quantities never drop below 1 and ids stay unique
//! 5. `clear_cart()` always yields count 0, total 0, closed drawer

use std::collections::HashMap;

use meadowlark_core::{CartStore, CurrencyCode, NewCartLine, Price, VariantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Strategy helpers ──────────────────────────────────────────────────

const IDS: &[&str] = &["v1", "v2", "v3", "v4", "v5"];

fn arb_id() -> impl Strategy<Value = VariantId> {
    prop::sample::select(IDS).prop_map(VariantId::new)
}

fn arb_price() -> impl Strategy<Value = Price> {
    (0i64..100_000).prop_map(|cents| Price::new(Decimal::new(cents, 2), CurrencyCode::USD))
}

fn arb_line() -> impl Strategy<Value = NewCartLine> {
    (arb_id(), arb_price()).prop_map(|(id, price)| NewCartLine {
        title: format!("Product {id}"),
        id,
        image: None,
        variant: None,
        price,
    })
}

#[derive(Debug, Clone)]
enum Op {
    Add(NewCartLine),
    Remove(VariantId),
    Update(VariantId, i64),
    Toggle,
    Open,
    Close,
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_line().prop_map(Op::Add),
        1 => arb_id().prop_map(Op::Remove),
        2 => (arb_id(), -3i64..20).prop_map(|(id, q)| Op::Update(id, q)),
        1 => Just(Op::Toggle),
        1 => Just(Op::Open),
        1 => Just(Op::Close),
        1 => Just(Op::Clear),
    ]
}

fn apply(cart: &mut CartStore, op: Op) {
    match op {
        Op::Add(line) => cart.add_item(line),
        Op::Remove(id) => cart.remove_item(&id),
        Op::Update(id, q) => cart.update_quantity(&id, q),
        Op::Toggle => cart.toggle_cart(),
        Op::Open => cart.open_cart(),
        Op::Close => cart.close_cart(),
        Op::Clear => cart.clear_cart(),
    }
}

fn recomputed_total(cart: &CartStore) -> Decimal {
    cart.lines()
        .iter()
        .map(|line| line.price.amount * Decimal::from(line.quantity))
        .sum()
}

proptest! {
    #[test]
    fn repeated_adds_accumulate_by_id(ids in prop::collection::vec(arb_id(), 0..40)) {
        let mut cart = CartStore::new();
        let mut counts: HashMap<VariantId, u32> = HashMap::new();
        let mut first_seen: Vec<VariantId> = Vec::new();

        for id in &ids {
            cart.add_item(NewCartLine::new(id.clone(), "item", Price::zero(CurrencyCode::USD)));
            let count = counts.entry(id.clone()).or_insert(0);
            if *count == 0 {
                first_seen.push(id.clone());
            }
            *count += 1;
        }

        prop_assert_eq!(cart.lines().len(), counts.len());
        for line in cart.lines() {
            prop_assert_eq!(Some(&line.quantity), counts.get(&line.id));
        }
        let order: Vec<VariantId> = cart.lines().iter().map(|l| l.id.clone()).collect();
        prop_assert_eq!(order, first_seen);
        prop_assert_eq!(cart.is_open(), !ids.is_empty());
    }

    #[test]
    fn update_to_zero_equals_remove(
        ops in prop::collection::vec(arb_op(), 0..30),
        id in arb_id(),
    ) {
        let mut cart = CartStore::new();
        for op in ops {
            apply(&mut cart, op);
        }

        let mut via_update = cart.clone();
        via_update.update_quantity(&id, 0);

        let mut via_remove = cart;
        via_remove.remove_item(&id);

        prop_assert_eq!(via_update, via_remove);
    }

    #[test]
    fn total_never_drifts(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut cart = CartStore::new();
        for op in ops {
            apply(&mut cart, op);
            prop_assert_eq!(cart.total().amount, recomputed_total(&cart));
            let count: u32 = cart.lines().iter().map(|l| l.quantity).sum();
            prop_assert_eq!(cart.item_count(), count);
        }
    }

    #[test]
    fn lines_stay_unique_and_positive(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut cart = CartStore::new();
        for op in ops {
            apply(&mut cart, op);
        }

        let mut seen = std::collections::HashSet::new();
        for line in cart.lines() {
            prop_assert!(line.quantity >= 1);
            prop_assert!(seen.insert(line.id.clone()));
        }
    }

    #[test]
    fn clear_always_resets(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut cart = CartStore::new();
        for op in ops {
            apply(&mut cart, op);
        }

        cart.clear_cart();

        prop_assert_eq!(cart.item_count(), 0);
        prop_assert!(cart.total().is_zero());
        prop_assert!(!cart.is_open());
    }
}
