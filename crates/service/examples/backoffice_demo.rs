//! Backoffice intake demo over the in-memory bus.
//!
//! Run with: cargo run --example backoffice_demo

use serde_json::json;

use formbridge_service::{FormService, IntakeResponse, ReceiptKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Standard catalog: userRegistration + contactForm schemas, one rule
    // and one handler per intake operation, in-memory bus.
    let service = FormService::standard()?;

    println!("Registered schemas:");
    for summary in service.list_schemas() {
        println!("  {} ({})", summary.id, summary.title);
    }

    // A valid registration: role falls back to its default.
    let receipt = service
        .submit_form(
            "userRegistration",
            &json!({
                "firstName": "Alice",
                "lastName": "Nguyen",
                "email": "alice@example.com",
                "age": 34,
            }),
        )
        .await?;
    println!(
        "\nSubmitted {} -> {:?} ({} handler outcome(s))",
        receipt.id,
        receipt.report.status,
        receipt.report.dispatch.as_ref().map_or(0, |d| d.outcomes.len()),
    );

    // An invalid registration: every violation is reported at once.
    let error = service
        .submit_form(
            "userRegistration",
            &json!({
                "firstName": "A",
                "lastName": "Nguyen",
                "email": "not-an-email",
            }),
        )
        .await
        .unwrap_err();
    let response = IntakeResponse::from_error(ReceiptKind::Submission, &error);
    println!(
        "\nRejected submission ({}):\n{}",
        error.status_code(),
        serde_json::to_string_pretty(&response)?
    );

    // Batch data processing counts its records.
    let receipt = service
        .process_data(
            "contactForm",
            &json!([
                {"name": "Bob", "email": "bob@example.com", "message": "First"},
                {"name": "Cara", "email": "cara@example.com", "message": "Second"},
            ]),
        )
        .await?;
    println!(
        "\nProcessed batch {} -> {:?}",
        receipt.id, receipt.report.status
    );

    // Introspection document for a schema.
    let document = service.schema_document("contactForm")?;
    println!(
        "\ncontactForm document:\n{}",
        serde_json::to_string_pretty(&document)?
    );

    Ok(())
}
