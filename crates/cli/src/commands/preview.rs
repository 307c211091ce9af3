use crate::commands::{prepare_quotation, CommandResult, QuotationArgs};

/// Prints the document payload exactly as `submit` would send it.
pub fn run(args: &QuotationArgs, pretty: bool) -> CommandResult {
    let prepared = match prepare_quotation("preview", args) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let payload = &prepared.quotation.payload;
    let rendered = if pretty { payload.to_json_pretty() } else { payload.to_json() };

    match rendered {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("preview", "serialization", error.to_string(), 1),
    }
}
