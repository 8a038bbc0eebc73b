pub mod dates;
pub mod guess;
pub mod layout;
pub mod mapper;
pub mod number;
pub mod options;
pub mod times;
pub mod transaction;

pub use dates::{
    default_date_layouts, parse_date_string, parse_date_strings, parse_date_strings_with,
    try_parse_date,
};
pub use guess::{guess, Confidence, FieldGuess, GuessOptions, GuessResult};
pub use layout::{Layout, ParseError};
pub use mapper::{FieldMapper, FieldMapping, FieldSource, Transform};
pub use number::{looks_like_amount, parse_amount, parse_significant_number, try_parse_number};
pub use options::merge_options;
pub use times::{
    format_time_string, parse_time_strings, parse_time_strings_with, to_ms, to_time_components,
    TimeComponents,
};
pub use transaction::{FieldValue, Metadata, Record, Transaction, TransactionKey, TransactionLike};
