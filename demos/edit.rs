//! cargo run --example=edit -- XZEJZZZZ '+---A-'

use adv_password::*;

fn main() -> anyhow::Result<()> {
    let text = std::env::args().nth(1).expect("Usage: edit <password> <ops>");
    let ops = std::env::args().nth(2).expect("Usage: edit <password> <ops>");

    let mut password = Password::parse(&text)?;
    let batch = FlagOpBatch::parse(&ops, password.flags().len())?;

    println!(
        "before: {} (flags 0x{:05X})",
        password,
        password.flags().value()
    );

    batch.apply(password.flags_mut())?;

    println!(
        "after:  {} (flags 0x{:05X})",
        password,
        password.flags().value()
    );

    Ok(())
}
