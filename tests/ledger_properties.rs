use chrono::NaiveDate;
use tempfile::TempDir;

use envelope_ledger::config::EnvelopePaths;
use envelope_ledger::error::ErrorKind;
use envelope_ledger::models::{Account, AccountType, BudgetPeriod, Category, Money};
use envelope_ledger::services::{
    AccountService, BudgetService, CategoryService, CreateTransactionInput, TransactionService,
};
use envelope_ledger::storage::Storage;

struct Ledger {
    checking: Account,
    card: Account,
    groceries: Category,
    payment: Category,
}

fn open_storage() -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let paths = EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf());
    let storage = Storage::open(paths).unwrap();
    (temp_dir, storage)
}

fn oct() -> BudgetPeriod {
    BudgetPeriod::monthly(2025, 10).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
}

fn usd(dollars: i64) -> Money {
    Money::from_cents(dollars * 100)
}

/// Checking with $5000 of October income, a card and a Groceries category
fn setup(storage: &Storage) -> Ledger {
    let accounts = AccountService::new(storage);
    let checking = accounts
        .create("Checking", AccountType::Checking, Money::zero())
        .unwrap();
    let card = accounts
        .create("Visa", AccountType::Credit, Money::zero())
        .unwrap();
    let groceries = CategoryService::new(storage)
        .create_category("Groceries", None)
        .unwrap();
    let payment = storage
        .categories
        .get_payment_category(card.id)
        .unwrap()
        .unwrap();

    TransactionService::new(storage)
        .create(
            CreateTransactionInput::new(checking.id, usd(5000), day(1)).description("Paycheck"),
        )
        .unwrap();

    Ledger {
        checking,
        card,
        groceries,
        payment,
    }
}

fn charge(storage: &Storage, ledger: &Ledger, amount: Money) {
    TransactionService::new(storage)
        .create(
            CreateTransactionInput::new(ledger.card.id, -amount, day(5))
                .category(ledger.groceries.id),
        )
        .unwrap();
}

#[test]
fn fully_budgeted_card_spending_is_covered() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(500)).unwrap();
    charge(&storage, &ledger, usd(200));

    let groceries = budget.category_balance(ledger.groceries.id, oct()).unwrap();
    let payment = budget.category_balance(ledger.payment.id, oct()).unwrap();
    let report = budget.underfunded(ledger.payment.id).unwrap().unwrap();

    assert_eq!(groceries.available, usd(300));
    assert_eq!(payment.available, usd(200));
    assert_eq!(report.underfunded, Money::zero());
    assert_eq!(budget.ready_to_assign(oct()).unwrap(), usd(4500));
}

#[test]
fn under_budgeted_card_spending_is_attributed() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(200));

    let groceries = budget.category_balance(ledger.groceries.id, oct()).unwrap();
    let payment = budget.category_balance(ledger.payment.id, oct()).unwrap();
    let report = budget.underfunded(ledger.payment.id).unwrap().unwrap();

    assert_eq!(groceries.available, usd(-100));
    assert_eq!(payment.available, usd(100));
    assert_eq!(report.debt, usd(200));
    assert_eq!(report.underfunded, usd(100));
    assert_eq!(report.responsible_categories(), vec![ledger.groceries.id]);

    let summary = budget.allocation_summary(oct()).unwrap();
    let row = summary
        .iter()
        .find(|r| r.category.id == ledger.payment.id)
        .unwrap();
    assert_eq!(row.underfunded, Some(usd(100)));
    assert_eq!(row.underfunded_categories, Some(vec!["Groceries".to_string()]));
}

#[test]
fn budget_assigned_after_the_charge_backs_it() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    charge(&storage, &ledger, usd(200));
    let before = budget.underfunded(ledger.payment.id).unwrap().unwrap();
    assert_eq!(before.underfunded, usd(200));
    assert_eq!(before.responsible_categories(), vec![ledger.groceries.id]);

    budget.assign(ledger.groceries.id, oct(), usd(500)).unwrap();

    let after = budget.underfunded(ledger.payment.id).unwrap().unwrap();
    assert_eq!(after.debt, usd(200));
    assert_eq!(after.unbudgeted_debt, Money::zero());
    assert_eq!(after.underfunded, Money::zero());
    assert!(after.responsible_categories().is_empty());

    let summary = budget.allocation_summary(oct()).unwrap();
    let row = summary
        .iter()
        .find(|r| r.category.id == ledger.payment.id)
        .unwrap();
    assert!(row.underfunded.is_none());
    assert!(row.underfunded_categories.is_none());
    assert_eq!(
        budget
            .cover_underfunded(ledger.payment.id, oct())
            .unwrap_err()
            .kind(),
        ErrorKind::NotUnderfunded
    );
}

#[test]
fn every_shortfall_names_a_category() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);
    let dining = CategoryService::new(&storage)
        .create_category("Dining", None)
        .unwrap();
    let txns = TransactionService::new(&storage);

    let check = || {
        for row in budget.allocation_summary(oct()).unwrap() {
            match (row.underfunded, row.underfunded_categories) {
                (Some(shortfall), Some(names)) => {
                    assert!(shortfall.is_positive());
                    assert!(
                        !names.is_empty(),
                        "{} has no responsible category",
                        row.category.name
                    );
                }
                (None, None) => {}
                other => panic!("inconsistent summary row: {:?}", other),
            }
        }
    };

    budget.assign(ledger.groceries.id, oct(), usd(50)).unwrap();
    charge(&storage, &ledger, usd(120));
    check();
    txns.create(
        CreateTransactionInput::new(ledger.card.id, usd(-80), day(6)).category(dining.id),
    )
    .unwrap();
    check();
    budget.assign(dining.id, oct(), usd(30)).unwrap();
    check();
    budget.assign(ledger.groceries.id, oct(), usd(400)).unwrap();
    check();
    budget
        .add_to_category(ledger.payment.id, oct(), usd(10))
        .unwrap();
    check();
    budget.assign(dining.id, oct(), usd(90)).unwrap();
    check();
    assert!(!budget
        .underfunded(ledger.payment.id)
        .unwrap()
        .unwrap()
        .is_underfunded());
}

#[test]
fn separate_handles_do_not_lose_writes() {
    let (temp_dir, first) = open_storage();
    let ledger = setup(&first);
    let paths = EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf());
    let second = Storage::open(paths.clone()).unwrap();

    TransactionService::new(&first)
        .create(CreateTransactionInput::new(ledger.checking.id, usd(1), day(2)))
        .unwrap();
    TransactionService::new(&second)
        .create(CreateTransactionInput::new(ledger.checking.id, usd(2), day(3)))
        .unwrap();

    let checking_id = ledger.checking.id;
    std::thread::scope(|s| {
        for storage in [&first, &second] {
            s.spawn(move || {
                for d in 10..15 {
                    TransactionService::new(storage)
                        .create(CreateTransactionInput::new(checking_id, usd(10), day(d)))
                        .unwrap();
                }
            });
        }
    });

    let reopened = Storage::open(paths).unwrap();
    assert_eq!(reopened.transactions.count().unwrap(), 13);
    let checking = reopened.accounts.get(ledger.checking.id).unwrap().unwrap();
    assert_eq!(checking.balance, usd(5103));
}

#[test]
fn available_matches_independent_sum() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);
    let txns = TransactionService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(250)).unwrap();
    charge(&storage, &ledger, usd(40));
    budget
        .add_to_category(ledger.groceries.id, oct(), usd(-50))
        .unwrap();
    txns.create(
        CreateTransactionInput::new(ledger.checking.id, Money::from_cents(-1234), day(9))
            .category(ledger.groceries.id),
    )
    .unwrap();
    let nov = oct().next();
    budget.assign(ledger.groceries.id, nov, usd(75)).unwrap();

    let allocated: Money = storage
        .allocations
        .get_for_category(ledger.groceries.id)
        .unwrap()
        .iter()
        .map(|a| a.amount)
        .sum();
    let spent: Money = storage
        .transactions
        .get_by_category(ledger.groceries.id)
        .unwrap()
        .iter()
        .filter(|t| t.is_outflow())
        .map(|t| t.amount.abs())
        .sum();

    let balance = budget.category_balance(ledger.groceries.id, nov).unwrap();
    assert_eq!(balance.available, allocated - spent);
    assert_eq!(balance.available, usd(275) - Money::from_cents(5234));
}

#[test]
fn unspent_funds_roll_over() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(50)).unwrap();

    let later = oct().next().next();
    let balance = budget.category_balance(ledger.groceries.id, later).unwrap();
    assert_eq!(balance.available, usd(50));
    assert_eq!(balance.activity, Money::zero());
}

#[test]
fn funding_payment_category_never_raises_shortfall() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(400));

    let mut previous = budget
        .underfunded(ledger.payment.id)
        .unwrap()
        .unwrap()
        .underfunded;
    assert_eq!(previous, usd(300));

    for extra in [usd(50), usd(100), usd(500)] {
        budget
            .add_to_category(ledger.payment.id, oct(), extra)
            .unwrap();
        let now = budget
            .underfunded(ledger.payment.id)
            .unwrap()
            .unwrap()
            .underfunded;
        assert_eq!(previous - now, extra.min(previous));
        previous = now;
    }
    assert_eq!(previous, Money::zero());
}

#[test]
fn second_cover_finds_nothing_to_cover() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(200));

    let result = budget.cover_underfunded(ledger.payment.id, oct()).unwrap();
    assert_eq!(result.covered_amount, usd(100));
    assert_eq!(result.ready_to_assign_after, usd(4800));

    let err = budget
        .cover_underfunded(ledger.payment.id, oct())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotUnderfunded);
}

#[test]
fn cover_with_exactly_enough_leaves_nothing() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);
    let rent = CategoryService::new(&storage)
        .create_category("Rent", None)
        .unwrap();

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(200));
    budget.assign(rent.id, oct(), usd(4800)).unwrap();
    assert_eq!(budget.ready_to_assign(oct()).unwrap(), usd(100));

    let result = budget.cover_underfunded(ledger.payment.id, oct()).unwrap();
    assert_eq!(result.ready_to_assign_after, Money::zero());
    assert_eq!(budget.ready_to_assign(oct()).unwrap(), Money::zero());
}

#[test]
fn cover_one_cent_short_fails_without_writing() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);
    let rent = CategoryService::new(&storage)
        .create_category("Rent", None)
        .unwrap();

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(200));
    budget
        .assign(rent.id, oct(), usd(4800) + Money::from_cents(1))
        .unwrap();
    let before = budget.allocation(ledger.payment.id, oct()).unwrap();

    let err = budget
        .cover_underfunded(ledger.payment.id, oct())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert!(err.to_string().contains("$99.99"));
    assert!(err.to_string().contains("$100.00"));
    assert_eq!(budget.allocation(ledger.payment.id, oct()).unwrap(), before);
}

#[test]
fn movement_is_capped_at_what_the_category_has() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(300)).unwrap();
    charge(&storage, &ledger, usd(500));

    let payment = budget.allocation(ledger.payment.id, oct()).unwrap().unwrap();
    assert_eq!(payment.amount, usd(300));
    assert_eq!(payment.moved_in, usd(300));

    // Only the charge itself takes Groceries below zero
    let groceries = budget.category_balance(ledger.groceries.id, oct()).unwrap();
    assert_eq!(groceries.total_allocated, usd(300));
    assert_eq!(groceries.available, usd(-200));
}

#[test]
fn concurrent_charges_never_move_more_than_budgeted() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    BudgetService::new(&storage)
        .assign(ledger.groceries.id, oct(), usd(100))
        .unwrap();

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| charge(&storage, &ledger, usd(30)));
        }
    });

    let payment = BudgetService::new(&storage)
        .allocation(ledger.payment.id, oct())
        .unwrap()
        .unwrap();
    assert_eq!(payment.moved_in, usd(100));

    let card = storage.accounts.get(ledger.card.id).unwrap().unwrap();
    assert_eq!(card.balance, usd(-240));
    assert_eq!(storage.transactions.count().unwrap(), 9);
}

#[test]
fn concurrent_covers_apply_once() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    let budget = BudgetService::new(&storage);

    budget.assign(ledger.groceries.id, oct(), usd(100)).unwrap();
    charge(&storage, &ledger, usd(200));

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| BudgetService::new(&storage).cover_underfunded(ledger.payment.id, oct()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::NotUnderfunded));
    assert_eq!(budget.ready_to_assign(oct()).unwrap(), usd(4800));
}

#[test]
fn failed_write_leaves_no_partial_effects() {
    let (_temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    BudgetService::new(&storage)
        .assign(ledger.groceries.id, oct(), usd(100))
        .unwrap();

    // The table stays readable but its replacement cannot be written.
    let blocker = storage.paths().accounts_file().with_extension("json.tmp");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("blocker"), b"").unwrap();

    let err = TransactionService::new(&storage)
        .create(
            CreateTransactionInput::new(ledger.card.id, usd(-60), day(7))
                .category(ledger.groceries.id),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(err.public_message(), "internal error");

    assert_eq!(storage.transactions.count().unwrap(), 1);
    let card = storage.accounts.get(ledger.card.id).unwrap().unwrap();
    assert_eq!(card.balance, Money::zero());
    assert!(BudgetService::new(&storage)
        .allocation(ledger.payment.id, oct())
        .unwrap()
        .is_none());

    let reopened = Storage::open(storage.paths().clone()).unwrap();
    assert_eq!(reopened.transactions.count().unwrap(), 1);
}

#[test]
fn ledger_survives_reopen() {
    let (temp_dir, storage) = open_storage();
    let ledger = setup(&storage);
    BudgetService::new(&storage)
        .assign(ledger.groceries.id, oct(), usd(100))
        .unwrap();
    charge(&storage, &ledger, usd(200));
    drop(storage);

    let paths = EnvelopePaths::with_base_dir(temp_dir.path().to_path_buf());
    let reopened = Storage::open(paths).unwrap();
    let budget = BudgetService::new(&reopened);

    assert_eq!(budget.ready_to_assign(oct()).unwrap(), usd(4900));
    assert_eq!(
        budget
            .underfunded(ledger.payment.id)
            .unwrap()
            .unwrap()
            .underfunded,
        usd(100)
    );
}
