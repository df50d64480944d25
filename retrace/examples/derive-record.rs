//! Deriving generators for records and enums.

use retrace::*;

#[derive(Generate, Debug, Clone, PartialEq)]
enum Role {
    Guest,
    Member { since: u16 },
    Admin,
}

#[derive(Generate, Debug, Clone, PartialEq)]
struct Account {
    name: String,
    balance: i64,
    role: Role,
}

/// Wrongly lets members who joined after year 2000 overdraw.
fn can_withdraw(account: &Account, amount: i64) -> bool {
    match account.role {
        Role::Member { since } if since > 2000 => true,
        _ => account.balance >= amount,
    }
}

fn main() {
    println!("=== Derived records ===\n");

    let result = property(|runner: &mut Runner| {
        let account = runner.generate("account", Account::arbitrary());
        let amount = runner.generate(
            "amount",
            Gen::<i64>::range(0, 1_000).expect("valid range"),
        );
        !can_withdraw(&account, amount) || account.balance >= amount
    })
    .named("withdrawals are covered")
    .with_printer(Printer::pretty())
    .run(&Config::default().with_tests(1000));

    println!("{result}");
}
