//! Request validation helpers shared by HTTP handlers.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, UserId};

/// Parse a UUID path or payload value, naming the field on failure.
pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        Error::invalid_request(format!("{field} must be a valid UUID"))
            .with_details(json!({ "field": field, "value": value }))
    })
}

/// Parse a list of user ids, naming the field on the first failure.
pub fn parse_user_ids(values: &[String], field: &str) -> Result<Vec<UserId>, Error> {
    values
        .iter()
        .map(|value| {
            UserId::new(value).map_err(|_| {
                Error::invalid_request(format!("{field} must contain valid user ids"))
                    .with_details(json!({ "field": field, "value": value }))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn uuids_parse_with_surrounding_whitespace() {
        let id = Uuid::new_v4();
        let parsed = parse_uuid(&format!(" {id} "), "ticketId").expect("valid uuid");
        assert_eq!(parsed, id);
    }

    #[rstest]
    fn invalid_uuids_name_the_field() {
        let error = parse_uuid("nope", "ticketId").expect_err("must reject");
        let details = error.details().expect("details present");
        assert_eq!(details["field"], "ticketId");
    }

    #[rstest]
    fn user_id_lists_reject_the_first_bad_entry() {
        let good = UserId::random().to_string();
        let error =
            parse_user_ids(&[good, "bad".to_owned()], "reviewers").expect_err("must reject");
        let details = error.details().expect("details present");
        assert_eq!(details["value"], "bad");
    }
}
