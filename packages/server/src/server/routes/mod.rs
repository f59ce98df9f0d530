mod health;
mod uploads;

pub use health::health_handler;
pub use uploads::{
    commit_receipt_handler, commit_statement_handler, delete_preview_handler, get_preview_handler,
    list_previews_handler, upload_receipt_handler, upload_statement_handler,
};
