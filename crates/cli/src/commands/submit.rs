use anyhow::Context;
use quoter_core::domain::quote::round_currency;
use quoter_documents::{DocumentClient, DocumentSubmitter, SubmissionError};
use serde_json::json;
use tracing::{error, info};

use crate::commands::{
    prepare_quotation, CommandResult, QuotationArgs, EXIT_CONFIG, EXIT_SUBMISSION,
};

pub fn run(args: &QuotationArgs) -> CommandResult {
    let prepared = match prepare_quotation("submit", args) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    if let Err(error) = prepared.config.validate_for_submission() {
        return CommandResult::failure("submit", "config_validation", error.to_string(), EXIT_CONFIG);
    }

    let client = match DocumentClient::new(&prepared.config.documents) {
        Ok(client) => client,
        Err(error) => return submission_failure(&error),
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("submit", "runtime", format!("{error:#}"), EXIT_SUBMISSION)
        }
    };

    let payload = &prepared.quotation.payload;
    match runtime.block_on(client.submit(payload)) {
        Ok(document) => {
            info!(
                event_name = "cli.submit.completed",
                correlation_id = %prepared.correlation_id,
                document_id = %document.id,
                "quotation submitted"
            );
            let totals = &prepared.quotation.priced.totals;
            CommandResult::success_with_details(
                "submit",
                format!("quotation submitted: view document at {}", document.view_url),
                Some(json!({
                    "document_id": document.id,
                    "document_status": document.status,
                    "view_url": document.view_url,
                    "document_name": payload.name,
                    "total": round_currency(totals.total_final).to_string(),
                })),
            )
        }
        Err(submission_error) => {
            error!(
                event_name = "cli.submit.failed",
                correlation_id = %prepared.correlation_id,
                error = %submission_error,
                "quotation submission failed"
            );
            submission_failure(&submission_error)
        }
    }
}

fn current_thread_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")
}

fn submission_failure(error: &SubmissionError) -> CommandResult {
    match error {
        SubmissionError::Rejected { status, body } => CommandResult::failure_with_details(
            "submit",
            "submission_rejected",
            format!("document API returned status {status}"),
            EXIT_SUBMISSION,
            Some(json!({ "status": status, "body": body })),
        ),
        SubmissionError::MissingApiKey => {
            CommandResult::failure("submit", "config_validation", error.to_string(), EXIT_CONFIG)
        }
        SubmissionError::Transport(_) => CommandResult::failure(
            "submit",
            "submission_transport",
            error.to_string(),
            EXIT_SUBMISSION,
        ),
        SubmissionError::Decode(_) => {
            CommandResult::failure("submit", "submission_decode", error.to_string(), EXIT_SUBMISSION)
        }
    }
}
