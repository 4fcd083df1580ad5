//! Debt settlement for a bill.
//!
//! Given a bill's charges and the money its initial payers fronted, computes
//! the pairwise payments that net every participant to zero: each remaining
//! debtor pays every remaining creditor a slice of their liability,
//! proportional to that creditor's share of the total fronted pool.
//!
//! Every per-cell amount is rounded *up* to the cent, so a debtor can pay up
//! to one cent more per creditor than their exact liability.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{Bill, BillType, EngineError, Payer, Payment, ResultEngine};

/// Insertion-ordered `user_id -> cents` aggregate. Input order drives the
/// order of the emitted payments.
type AmountsByUser = IndexMap<String, i64>;

/// Computes the payments settling `bill`.
///
/// Returns an empty list when nobody fronted money. Fails with
/// [`EngineError::Validation`] if a computed amount turns out negative,
/// which signals corrupted liability bookkeeping upstream; in that case
/// nothing must be persisted.
pub fn compute_payments(bill: &Bill, now: DateTime<Utc>) -> ResultEngine<Vec<Payment>> {
    let mut amounts_to_pay = aggregate_liabilities(bill);
    let (mut amounts_to_receive, total_credit_pool) =
        apply_initial_payments(&bill.initial_payers, &mut amounts_to_pay);

    // Guard against non-positive leftovers; should not occur for well-formed
    // input but keeps the apportionment total.
    amounts_to_pay.retain(|_, amount| *amount > 0);
    amounts_to_receive.retain(|_, amount| *amount > 0);

    apportion(
        bill.id,
        &amounts_to_pay,
        &amounts_to_receive,
        total_credit_pool,
        now,
    )
}

/// Step 1: sums what every participant owes, keyed by user id.
///
/// Duplicate user ids accumulate; reordering entries for distinct users does
/// not change the totals.
fn aggregate_liabilities(bill: &Bill) -> AmountsByUser {
    let mut amounts_to_pay = AmountsByUser::new();
    match bill.bill_type {
        BillType::SplitByMembers => {
            for payer in &bill.payers {
                *amounts_to_pay.entry(payer.user_id.clone()).or_insert(0) += payer.amount_minor;
            }
        }
        BillType::SplitByProducts => {
            for product in &bill.products {
                for payer in &product.assigned_payers {
                    *amounts_to_pay.entry(payer.user_id.clone()).or_insert(0) +=
                        payer.amount_minor;
                }
            }
        }
    }
    amounts_to_pay
}

/// Step 2: credits fronted money against the payer's own liability, in input
/// order, and collects what is left over as redistributable credit.
///
/// Repeated entries for one user adjust against the *current* liability
/// state, and a later leftover replaces that user's credit slot while the
/// pool keeps the sum of every leftover. Reordering duplicate entries can
/// therefore change the outcome; that asymmetry is observable API behavior
/// and is covered by tests.
fn apply_initial_payments(
    initial_payers: &[Payer],
    amounts_to_pay: &mut AmountsByUser,
) -> (AmountsByUser, i64) {
    let mut amounts_to_receive = AmountsByUser::new();
    let mut total_credit_pool = 0i64;

    for initial_payer in initial_payers {
        let mut remaining = initial_payer.amount_minor;
        if let Some(liability) = amounts_to_pay.get(&initial_payer.user_id).copied() {
            if remaining >= liability {
                // Own share fully self-covered.
                amounts_to_pay.shift_remove(&initial_payer.user_id);
                remaining -= liability;
            } else {
                amounts_to_pay.insert(initial_payer.user_id.clone(), liability - remaining);
                remaining = 0;
            }
        }
        if remaining > 0 {
            amounts_to_receive.insert(initial_payer.user_id.clone(), remaining);
            total_credit_pool += remaining;
        }
    }

    (amounts_to_receive, total_credit_pool)
}

/// Step 4: the full debtor x creditor cross product.
///
/// Zero-amount cells are still emitted, so the number of payments is always
/// `|debtors| * |creditors|`.
fn apportion(
    bill_id: Uuid,
    amounts_to_pay: &AmountsByUser,
    amounts_to_receive: &AmountsByUser,
    total_credit_pool: i64,
    now: DateTime<Utc>,
) -> ResultEngine<Vec<Payment>> {
    if total_credit_pool <= 0 {
        // Nobody fronted money: nothing to settle.
        return Ok(Vec::new());
    }

    let mut payments = Vec::with_capacity(amounts_to_pay.len() * amounts_to_receive.len());
    for (payer_id, amount_to_pay) in amounts_to_pay {
        for (recipient_id, credit) in amounts_to_receive {
            let amount_minor = ceil_share(*amount_to_pay, *credit, total_credit_pool);
            if amount_minor < 0 {
                return Err(EngineError::Validation(
                    "amount to be paid cannot be negative".to_string(),
                ));
            }
            payments.push(Payment::new(
                Some(bill_id),
                amount_minor,
                payer_id.clone(),
                recipient_id.clone(),
                now,
            ));
        }
    }

    Ok(payments)
}

/// `ceil(liability * credit / pool)` in cents, computed exactly.
///
/// This is the integer form of the original rule
/// `ceil(liability * (credit / pool) * 100) / 100`: round the debtor's
/// proportional slice up to the next cent.
fn ceil_share(liability_minor: i64, credit_minor: i64, pool_minor: i64) -> i64 {
    let numerator = i128::from(liability_minor) * i128::from(credit_minor);
    let pool = i128::from(pool_minor);
    let quotient = numerator.div_euclid(pool);
    let cell = if numerator.rem_euclid(pool) > 0 {
        quotient + 1
    } else {
        quotient
    };
    cell as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Product;

    fn payer(user_id: &str, amount_minor: i64) -> Payer {
        Payer {
            user_id: user_id.to_string(),
            amount_minor,
        }
    }

    fn members_bill(payers: Vec<Payer>, initial_payers: Vec<Payer>) -> Bill {
        Bill {
            id: Uuid::new_v4(),
            group_id: "group".to_string(),
            owner_id: "owner".to_string(),
            name: "Dinner".to_string(),
            description: String::new(),
            bill_type: BillType::SplitByMembers,
            date: Utc::now(),
            payers,
            products: Vec::new(),
            initial_payers,
            payment_ids: Vec::new(),
        }
    }

    fn products_bill(products: Vec<Product>, initial_payers: Vec<Payer>) -> Bill {
        Bill {
            bill_type: BillType::SplitByProducts,
            products,
            payers: Vec::new(),
            ..members_bill(Vec::new(), initial_payers)
        }
    }

    #[test]
    fn no_initial_payers_yields_no_payments() {
        let bill = members_bill(vec![payer("u1", 3000), payer("u2", 2000)], Vec::new());
        let payments = compute_payments(&bill, Utc::now()).unwrap();
        assert!(payments.is_empty());
    }

    #[test]
    fn covering_initial_payment_settles_the_rest() {
        // U1 owes 30.00, U2 owes 20.00, U1 fronted 50.00: U1's own share is
        // self-covered and U2 owes U1 exactly 20.00.
        let bill = members_bill(
            vec![payer("u1", 3000), payer("u2", 2000)],
            vec![payer("u1", 5000)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].payer_id, "u2");
        assert_eq!(payments[0].recipient_id, "u1");
        assert_eq!(payments[0].amount_minor, 2000);
        assert_eq!(payments[0].bill_id, Some(bill.id));
    }

    #[test]
    fn even_split_with_single_creditor() {
        let bill = members_bill(
            vec![payer("u1", 1000), payer("u2", 1000), payer("u3", 1000)],
            vec![payer("u1", 3000)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 2);
        assert!(
            payments
                .iter()
                .all(|p| p.recipient_id == "u1" && p.amount_minor == 1000)
        );
        let payer_ids: Vec<_> = payments.iter().map(|p| p.payer_id.as_str()).collect();
        assert_eq!(payer_ids, ["u2", "u3"]);
    }

    #[test]
    fn product_split_aggregates_across_products() {
        let bill = products_bill(
            vec![
                Product {
                    name: "Pizza".to_string(),
                    price_minor: 1800,
                    quantity: 2,
                    assigned_payers: vec![payer("u1", 900), payer("u2", 900)],
                },
                Product {
                    name: "Wine".to_string(),
                    price_minor: 1200,
                    quantity: 1,
                    assigned_payers: vec![payer("u2", 600), payer("u3", 600)],
                },
            ],
            vec![payer("u1", 3000)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        // u1 fronted 30.00 and owes 9.00, leaving 21.00 of credit; u2 owes
        // 9.00 + 6.00, u3 owes 6.00.
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payer_id, "u2");
        assert_eq!(payments[0].amount_minor, 1500);
        assert_eq!(payments[1].payer_id, "u3");
        assert_eq!(payments[1].amount_minor, 600);
    }

    #[test]
    fn cross_product_cardinality() {
        let bill = members_bill(
            vec![payer("d1", 1000), payer("d2", 500)],
            vec![payer("c1", 700), payer("c2", 300)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 4);
        let amounts: Vec<_> = payments
            .iter()
            .map(|p| (p.payer_id.as_str(), p.recipient_id.as_str(), p.amount_minor))
            .collect();
        assert_eq!(
            amounts,
            [
                ("d1", "c1", 700),
                ("d1", "c2", 300),
                ("d2", "c1", 350),
                ("d2", "c2", 150),
            ]
        );
    }

    #[test]
    fn ceiling_rounds_each_cell_up() {
        // 10.00 split across three equal creditors: 3.34 per cell, so the
        // debtor overpays by 2 cents, strictly less than one cent per
        // creditor.
        let bill = members_bill(
            vec![payer("d", 1000)],
            vec![payer("c1", 100), payer("c2", 100), payer("c3", 100)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 3);
        assert!(payments.iter().all(|p| p.amount_minor == 334));
        let paid: i64 = payments.iter().map(|p| p.amount_minor).sum();
        let overpayment = paid - 1000;
        assert!((0..3).contains(&overpayment));
    }

    #[test]
    fn aggregation_is_order_independent_for_distinct_users() {
        let forward = members_bill(
            vec![payer("u1", 700), payer("u2", 1100), payer("u3", 200)],
            vec![payer("c", 500)],
        );
        let mut shuffled = forward.clone();
        shuffled.payers.reverse();

        let a = compute_payments(&forward, Utc::now()).unwrap();
        let b = compute_payments(&shuffled, Utc::now()).unwrap();

        let totals = |payments: &[Payment]| {
            let mut by_payer: Vec<_> = payments
                .iter()
                .map(|p| (p.payer_id.clone(), p.amount_minor))
                .collect();
            by_payer.sort();
            by_payer
        };
        assert_eq!(totals(&a), totals(&b));
    }

    #[test]
    fn duplicate_payer_entries_accumulate() {
        let bill = members_bill(
            vec![payer("u1", 500), payer("u1", 700)],
            vec![payer("c", 100)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_minor, 1200);
    }

    #[test]
    fn duplicate_initial_payer_entries_are_order_dependent() {
        // The second entry for the same user replaces the recorded credit
        // while the pool keeps both leftovers, so the ordering of the two
        // entries changes what the remaining debtor pays.
        let forward = members_bill(
            vec![payer("x", 1000), payer("y", 1000)],
            vec![payer("x", 3000), payer("x", 2000)],
        );
        let mut reversed = forward.clone();
        reversed.initial_payers.reverse();

        let a = compute_payments(&forward, Utc::now()).unwrap();
        let b = compute_payments(&reversed, Utc::now()).unwrap();

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].amount_minor, 500);
        assert_eq!(b[0].amount_minor, 750);
    }

    #[test]
    fn partial_self_cover_reduces_liability() {
        // U1 owes 30.00 but fronted only 10.00: U1 stays a debtor for the
        // remaining 20.00 and no credit is recorded for them.
        let bill = members_bill(
            vec![payer("u1", 3000), payer("u2", 1000)],
            vec![payer("u1", 1000), payer("c", 2000)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].payer_id, "u1");
        assert_eq!(payments[0].recipient_id, "c");
        assert_eq!(payments[0].amount_minor, 2000);
        assert_eq!(payments[1].payer_id, "u2");
        assert_eq!(payments[1].amount_minor, 1000);
    }

    #[test]
    fn zero_amount_cells_are_still_emitted() {
        let mut amounts_to_pay = AmountsByUser::new();
        amounts_to_pay.insert("d".to_string(), 0);
        let mut amounts_to_receive = AmountsByUser::new();
        amounts_to_receive.insert("c".to_string(), 100);

        let payments = apportion(
            Uuid::new_v4(),
            &amounts_to_pay,
            &amounts_to_receive,
            100,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount_minor, 0);
    }

    #[test]
    fn negative_cell_fails_validation() {
        // Unreachable through compute_payments on well-formed input (the
        // filter drops negative liabilities); injected directly to pin the
        // invariant guard.
        let mut amounts_to_pay = AmountsByUser::new();
        amounts_to_pay.insert("d".to_string(), -100);
        let mut amounts_to_receive = AmountsByUser::new();
        amounts_to_receive.insert("c".to_string(), 100);

        let result = apportion(
            Uuid::new_v4(),
            &amounts_to_pay,
            &amounts_to_receive,
            100,
            Utc::now(),
        );

        assert_eq!(
            result.unwrap_err(),
            EngineError::Validation("amount to be paid cannot be negative".to_string())
        );
    }

    #[test]
    fn rounding_overpayment_is_bounded_per_debtor() {
        let bill = members_bill(
            vec![payer("d1", 997), payer("d2", 1303)],
            vec![payer("c1", 301), payer("c2", 457), payer("c3", 99)],
        );
        let payments = compute_payments(&bill, Utc::now()).unwrap();
        assert_eq!(payments.len(), 6);

        for (debtor, liability) in [("d1", 997i64), ("d2", 1303i64)] {
            let paid: i64 = payments
                .iter()
                .filter(|p| p.payer_id == debtor)
                .map(|p| p.amount_minor)
                .sum();
            let drift = paid - liability;
            assert!((0..3).contains(&drift), "drift {drift} for {debtor}");
        }
    }
}
