// # Meraki Dashboard Real Environment Validation Tool
//
// Exercises the Meraki transport and the Local DNS reads against the real
// Dashboard API. Read-only unless `LOCALDNS_MODE=live`.
//
// ## Usage
//
// ```bash
// # Read-only mode (default - safe)
// MK_CSM_KEY=your_key \
// LOCALDNS_ORGANIZATION_ID=123456 \
// cargo run -p embedded_session --bin meraki_validation
//
// # Live mode (creates and deletes a throwaway profile!)
// LOCALDNS_MODE=live \
// MK_CSM_KEY=your_key \
// LOCALDNS_ORGANIZATION_ID=123456 \
// cargo run -p embedded_session --bin meraki_validation
// ```
//
// ## Environment Variables
//
// Required:
// - `MK_CSM_KEY`: Dashboard API key
//
// Optional:
// - `LOCALDNS_ORGANIZATION_ID`: Organization to inspect (default: first listed)
// - `LOCALDNS_MODE`: "read-only" or "live" (default: read-only)

use localdns_core::{RequiredParameters, SessionConfig, SetupParameters};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("=== Meraki Dashboard Real Environment Validation ===");

    let mode = env::var("LOCALDNS_MODE").unwrap_or_else(|_| "read-only".to_string());
    let live = mode == "live";
    tracing::info!("Mode: {}", mode);

    let mut session = localdns_meraki::connect(SessionConfig::default(), None)?;
    if !session.is_api_key_set() {
        tracing::error!("MK_CSM_KEY environment variable is required");
        std::process::exit(1);
    }

    // Step 1: organizations
    tracing::info!("Step 1: Listing organizations...");
    let organizations = match session.list_organizations(false).await {
        Ok(orgs) => orgs,
        Err(e) => {
            tracing::error!("❌ Failed to list organizations: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("✅ {} organization(s) visible", organizations.len());

    let organization_id = match env::var("LOCALDNS_ORGANIZATION_ID") {
        Ok(id) => id,
        Err(_) => match organizations.first() {
            Some(org) => org.id.clone(),
            None => {
                tracing::error!("No organization available to inspect");
                std::process::exit(1);
            }
        },
    };
    let name = organizations
        .iter()
        .find(|org| org.id == organization_id)
        .map(|org| org.name.clone());

    let setup = SetupParameters::new().with_organization(&organization_id, name);
    if !session.setup_application_parameters(RequiredParameters::organization(), Some(&setup), Some(true)) {
        tracing::error!("Scope setup failed: {:?}", session.check_current_parameters_status());
        std::process::exit(1);
    }

    // Step 2: joined reads
    tracing::info!("Step 2: Reading Local DNS state of {}...", organization_id);
    let dns = session.local_dns();
    let profiles = dns.list_profiles(true).await?;
    tracing::info!("✅ {} profile(s)", profiles.len());
    for view in &profiles {
        tracing::info!("   {} ({}) -> {}", view.name, view.profile_id, view.network_name);
    }
    let records = dns.list_dns_records().await?;
    tracing::info!("✅ {} record(s)", records.len());
    let assignments = dns.list_network_assignments(true).await?;
    tracing::info!("✅ {} assignment(s)", assignments.len());

    // Step 3: mutation round trip
    if !live {
        tracing::info!("Step 3: Skipped (read-only mode). Set LOCALDNS_MODE=live to create and delete a profile.");
        tracing::info!("=== Validation Complete ===");
        return Ok(());
    }

    tracing::info!("Step 3: Creating a throwaway profile...");
    let profile = dns.create_profile("localdns-validation").await?;
    tracing::info!("✅ Created profile {}", profile.profile_id);

    match dns.delete_profile(&profile.profile_id).await {
        Ok(()) => tracing::info!("✅ Deleted profile {}", profile.profile_id),
        Err(e) => {
            tracing::error!("❌ Failed to delete profile {}: {}", profile.profile_id, e);
            std::process::exit(2);
        }
    }

    tracing::info!("=== Validation Complete ===");
    Ok(())
}
