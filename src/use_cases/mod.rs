// Use cases layer: one workflow per API operation, generic over the ports.

pub mod directory;
pub mod draft;
pub mod draft_fields;
pub mod locks;
pub mod login;
pub mod logout;
pub mod repositories;
pub mod review_requests;
pub mod set_draft_field;
pub mod update_draft;
pub mod verify_session;

#[cfg(test)]
pub(crate) mod test_support;
