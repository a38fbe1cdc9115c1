//! Walks the full token operation cycle against the in-memory world
//! state: initialize, mint, transfer, approve, transferFrom, burn.
//!
//! Run with: cargo run --example token_cycle

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cbdc_state::MemoryLedgerContext;
use cbdc_token::{TokenContract, TokenError};

fn identity_token(cn: &str) -> String {
    BASE64.encode(format!("x509::CN={cn},OU=client::O=DemoCA"))
}

#[tokio::main]
async fn main() -> Result<(), TokenError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = MemoryLedgerContext::new();
    let contract = TokenContract::default();

    let minter_id = identity_token("minter@centralbank.example.com");
    let alice_id = identity_token("Alice@org1.example.com");
    let bob_id = identity_token("Bob@org1.example.com");

    let minter = store.as_caller(&minter_id, "CentralBankMSP");
    let alice = store.as_caller(&alice_id, "Org1MSP");
    let bob = store.as_caller(&bob_id, "Org1MSP");

    contract.initialize(&minter, "Digital Yuan", "DCEP", 2).await?;
    println!(
        "initialized {} ({})",
        contract.name(&minter).await?,
        contract.symbol(&minter).await?
    );

    contract.mint(&minter, 1_000_00).await?;
    println!("minted, supply = {}", contract.total_supply(&minter).await?);

    contract.transfer(&minter, &alice_id, 250_00).await?;
    println!(
        "transferred, alice = {}",
        contract.client_account_balance(&alice).await?
    );

    contract.approve(&alice, &bob_id, 100_00).await?;
    contract.transfer_from(&bob, &alice_id, &minter_id, 60_00).await?;
    println!(
        "delegated spend done, remaining allowance = {}",
        contract.allowance(&alice, &alice_id, &bob_id).await?
    );

    contract.burn(&minter, 500_00).await?;
    println!("burned, supply = {}", contract.total_supply(&minter).await?);

    // An over-limit delegated spend fails closed.
    match contract.transfer_from(&bob, &alice_id, &minter_id, 999_00).await {
        Err(TokenError::InsufficientAllowance { available, required }) => {
            println!("rejected as expected: allowance {available} < {required}")
        }
        other => println!("unexpected outcome: {other:?}"),
    }

    Ok(())
}
