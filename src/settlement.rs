use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use derive_getters::Getters;
use derive_more::{Constructor, Deref};
use log::info;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::ledger::Ledger;

#[derive(Debug, Error)]
pub enum SettlementError {
    // Also guards the average computation, which would otherwise divide by
    // the participant count of zero.
    #[error("No data read from file..")]
    NoParticipants,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Constructor, Debug, Getters, PartialEq)]
pub struct Transfer {
    payer: String,
    payee: String,
    amount: Decimal,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} to {}", self.payer, self.amount, self.payee)
    }
}

#[derive(Debug, Deref, PartialEq)]
pub struct Settlement(Vec<Transfer>);

impl Settlement {
    pub fn from_ledger(ledger: &Ledger) -> Result<Self, SettlementError> {
        if ledger.is_empty() {
            return Err(SettlementError::NoParticipants);
        }

        let average = average_share(ledger);
        info!("average share per participant: {average}");

        let mut debtors: Vec<(&str, Decimal)> = ledger
            .iter()
            .filter(|&(_, &paid)| paid < average)
            .map(|(name, &paid)| (name.as_str(), average - paid))
            .collect();
        let mut creditors: Vec<(&str, Decimal)> = ledger
            .iter()
            .filter(|&(_, &paid)| paid > average)
            .map(|(name, &paid)| (name.as_str(), paid - average))
            .collect();

        // Largest debts settle first, clearing the smallest open surpluses;
        // the stable sorts keep first-seen input order on ties.
        debtors.sort_by(|a, b| b.1.cmp(&a.1));
        creditors.sort_by(|a, b| a.1.cmp(&b.1));

        let mut transfers = Vec::new();
        let (mut d, mut c) = (0, 0);
        while d < debtors.len() && c < creditors.len() {
            let amount = debtors[d].1.min(creditors[c].1);
            transfers.push(Transfer::new(
                debtors[d].0.to_string(),
                creditors[c].0.to_string(),
                amount,
            ));

            debtors[d].1 -= amount;
            creditors[c].1 -= amount;
            if debtors[d].1.is_zero() {
                d += 1;
            }
            if creditors[c].1.is_zero() {
                c += 1;
            }
        }

        Ok(Self(transfers))
    }

    pub fn to_file(&self, path: &Path) -> Result<(), SettlementError> {
        let mut writer = BufWriter::new(File::create(path)?);
        for transfer in &self.0 {
            writeln!(writer, "{transfer}")?;
        }
        writer.flush()?;

        info!("settlement instructions written to {}", path.display());
        Ok(())
    }
}

fn average_share(ledger: &Ledger) -> Decimal {
    let total: Decimal = ledger.values().copied().sum();
    (total / Decimal::from(ledger.len()))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    fn ledger(totals: &[(&str, Decimal)]) -> Ledger {
        Ledger::new(
            totals
                .iter()
                .map(|(name, amount)| (name.to_string(), *amount))
                .collect(),
        )
    }

    #[rstest]
    #[case::shared_house(
        &[
            ("Claire", dec!(203.55)),
            ("Bob", dec!(141.50)),
            ("David", dec!(267.70)),
            ("Alicia", dec!(100.80)),
        ],
        &[
            ("Alicia", "Claire", dec!(25.16)),
            ("Alicia", "David", dec!(52.43)),
            ("Bob", "David", dec!(36.88)),
        ]
    )]
    #[case::two_participants(
        &[("Ann", dec!(100.00)), ("Bob", dec!(0))],
        &[("Bob", "Ann", dec!(50.00))]
    )]
    #[case::already_level(&[("Ann", dec!(20.00)), ("Bob", dec!(20.00))], &[])]
    #[case::single_participant(&[("Ann", dec!(42.00))], &[])]
    #[case::sub_cent_amounts(
        &[("Ann", dec!(0.005)), ("Bob", dec!(10.000))],
        &[("Ann", "Bob", dec!(4.995))]
    )]
    fn settles_ledgers(
        #[case] totals: &[(&str, Decimal)],
        #[case] expected: &[(&str, &str, Decimal)],
    ) {
        let settlement = Settlement::from_ledger(&ledger(totals)).unwrap();

        let expected: Vec<Transfer> = expected
            .iter()
            .map(|(payer, payee, amount)| {
                Transfer::new(payer.to_string(), payee.to_string(), *amount)
            })
            .collect();
        assert_eq!(*settlement, expected);
    }

    #[test]
    fn money_is_conserved_and_balances_level_out() {
        let mut working = ledger(&[
            ("Claire", dec!(203.55)),
            ("Bob", dec!(141.50)),
            ("David", dec!(267.70)),
            ("Alicia", dec!(100.80)),
        ]);
        let before: Decimal = working.values().copied().sum();

        let settlement = Settlement::from_ledger(&working).unwrap();
        for transfer in settlement.iter() {
            *working.get_mut(transfer.payer()).unwrap() += *transfer.amount();
            *working.get_mut(transfer.payee()).unwrap() -= *transfer.amount();
        }

        assert_eq!(working.values().copied().sum::<Decimal>(), before);
        for (_, &balance) in working.iter() {
            assert!((balance - dec!(178.39)).abs() <= dec!(0.01));
        }
    }

    #[test]
    fn renders_payment_instructions() {
        let transfer = Transfer::new("Ann".to_string(), "Bob".to_string(), dec!(12.34));
        assert_eq!(transfer.to_string(), "Ann pays 12.34 to Bob");
    }

    #[test]
    fn empty_ledger_cannot_be_settled() {
        let result = Settlement::from_ledger(&Ledger::new(IndexMap::new()));
        assert!(matches!(result, Err(SettlementError::NoParticipants)));
    }

    #[test]
    fn writes_one_instruction_per_line() {
        let settlement = Settlement(vec![
            Transfer::new("Ann".to_string(), "Bob".to_string(), dec!(1.50)),
            Transfer::new("Cem".to_string(), "Bob".to_string(), dec!(2.00)),
        ]);

        let path = std::env::temp_dir().join("split-engine-settlement-test.txt");
        settlement.to_file(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "Ann pays 1.50 to Bob\nCem pays 2.00 to Bob\n");
    }
}
