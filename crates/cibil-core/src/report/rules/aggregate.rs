//! Deduplication of account matches and derived counts.

use tracing::debug;

use super::ExtractionMatch;
use super::accounts::AccountMatch;
use crate::models::report::{AccountCounts, AccountRecord, AccountStatus, AccountType};

/// Deduplicated records and the counts derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedAccounts {
    pub records: Vec<AccountRecord>,
    pub counts: AccountCounts,
}

/// Merge matches of the same lender and type that lie within `dedup_window`
/// bytes of the previous occurrence of that account.
///
/// The first occurrence keeps its position; later ones only fill in what it
/// lacks. Matches must be in document order.
pub fn aggregate(matches: Vec<ExtractionMatch<AccountMatch>>, dedup_window: usize) -> AggregatedAccounts {
    let mut records: Vec<AccountRecord> = Vec::new();
    // Position of the latest match merged into each record
    let mut last_seen: Vec<usize> = Vec::new();

    for m in matches {
        let position = m.position.0;
        let account = m.value;

        let existing = records.iter().zip(&last_seen).rposition(|(r, &seen)| {
            same_account(&r.bank_name, &account.bank_name)
                && r.account_type == account.account_type
                && position.saturating_sub(seen) <= dedup_window
        });

        match existing {
            Some(i) => {
                debug!("Merging duplicate {} at {} into {}", account.bank_name, position, records[i].position);
                merge(&mut records[i], account);
                last_seen[i] = position;
            }
            None => {
                records.push(AccountRecord {
                    bank_name: account.bank_name,
                    account_type: account.account_type,
                    status: account.status,
                    product: account.product,
                    credit_limit: account.credit_limit,
                    outstanding_balance: account.outstanding_balance,
                    close_date: account.close_date,
                    adverse: account.adverse,
                    position,
                });
                last_seen.push(position);
            }
        }
    }

    let counts = count(&records);
    AggregatedAccounts { records, counts }
}

/// Lender names compare without spaces, so "HDFCBANK" and "HDFC BANK" agree.
fn same_account(a: &str, b: &str) -> bool {
    a.chars().filter(|c| !c.is_whitespace()).eq(b.chars().filter(|c| !c.is_whitespace()))
}

fn merge(record: &mut AccountRecord, other: AccountMatch) {
    if record.status == AccountStatus::Unknown {
        record.status = other.status;
    }
    record.product = record.product.take().or(other.product);
    record.credit_limit = record.credit_limit.or(other.credit_limit);
    record.outstanding_balance = record.outstanding_balance.or(other.outstanding_balance);
    record.close_date = record.close_date.or(other.close_date);
    record.adverse |= other.adverse;
}

/// Counts derived from records alone; reported figures are reconciled later.
pub fn count(records: &[AccountRecord]) -> AccountCounts {
    let mut counts = AccountCounts {
        extracted_accounts: records.len() as u32,
        ..AccountCounts::default()
    };

    for record in records {
        match record.account_type {
            AccountType::Card => counts.card_count += 1,
            AccountType::Loan => counts.loan_count += 1,
            AccountType::Unknown => counts.unknown_type_count += 1,
        }
        match record.status {
            AccountStatus::Active => counts.active_accounts += 1,
            AccountStatus::Closed => counts.closed_accounts += 1,
            AccountStatus::Unknown => counts.unknown_status_count += 1,
        }
        if record.adverse {
            counts.adverse_count += 1;
        }
    }

    counts.total_accounts = counts.extracted_accounts;
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account(bank: &str, account_type: AccountType, status: AccountStatus, at: usize) -> ExtractionMatch<AccountMatch> {
        ExtractionMatch::new(
            AccountMatch {
                bank_name: bank.to_string(),
                account_type,
                status,
                product: None,
                credit_limit: None,
                outstanding_balance: None,
                close_date: None,
                adverse: false,
            },
            bank,
        )
        .with_position(at, at + bank.len())
    }

    #[test]
    fn test_duplicates_within_window_merge() {
        let result = aggregate(
            vec![
                account("HDFC BANK", AccountType::Card, AccountStatus::Unknown, 0),
                account("HDFC BANK", AccountType::Card, AccountStatus::Active, 120),
            ],
            250,
        );
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].status, AccountStatus::Active);
        assert_eq!(result.records[0].position, 0);
    }

    #[test]
    fn test_window_slides_with_each_merge() {
        let result = aggregate(
            vec![
                account("HDFC BANK", AccountType::Card, AccountStatus::Active, 0),
                account("HDFCBANK", AccountType::Card, AccountStatus::Active, 200),
                account("HDFC BANK", AccountType::Card, AccountStatus::Active, 400),
            ],
            250,
        );
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_distant_or_different_accounts_kept() {
        let result = aggregate(
            vec![
                account("HDFC BANK", AccountType::Card, AccountStatus::Active, 0),
                account("HDFC BANK", AccountType::Loan, AccountStatus::Active, 50),
                account("HDFC BANK", AccountType::Card, AccountStatus::Closed, 2000),
                account("SBI", AccountType::Unknown, AccountStatus::Unknown, 2100),
            ],
            250,
        );
        assert_eq!(result.records.len(), 4);
        assert_eq!(
            result.counts,
            AccountCounts {
                total_accounts: 4,
                active_accounts: 2,
                closed_accounts: 1,
                extracted_accounts: 4,
                card_count: 2,
                loan_count: 1,
                unknown_type_count: 1,
                unknown_status_count: 1,
                adverse_count: 0,
            }
        );
    }

    #[test]
    fn test_empty() {
        let result = aggregate(Vec::new(), 250);
        assert!(result.records.is_empty());
        assert_eq!(result.counts, AccountCounts::default());
    }
}
