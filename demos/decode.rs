//! cargo run --example=decode -- XZEJZZZZ

use adv_password::*;

fn main() -> anyhow::Result<()> {
    let text = std::env::args().nth(1).expect("Usage: decode <password>");

    let password = Password::parse(&text)?;

    println!("text:   {password}");
    println!(
        "scene:  {} (0x{:03X})",
        password.scene(),
        password.scene().value()
    );
    println!(
        "flags:  {} (0x{:05X})",
        password.flags(),
        password.flags().value()
    );
    println!("value:  {}", password.value());
    println!("binary: {}", password.format("VB1")?);
    println!("hex:    {}", password.format("PX")?);
    println!("digits: {}", password.format("PD")?);

    Ok(())
}
