//! Operations exposed through the gateway.

use tenantgate_core::models::permission::{Action, Feature};

use crate::request::Operation;

/// Self-service tenant signup. Public.
pub const SIGNUP_CLIENT: Operation = Operation::new("auth.signup_client");

pub const WHOAMI: Operation = Operation::new("auth.whoami");

pub const LIST_MEMBERS: Operation =
    Operation::requires("members.list", Feature::Users, Action::Read);
pub const GET_MEMBER: Operation = Operation::requires("members.get", Feature::Users, Action::Read);
pub const CREATE_MEMBER: Operation =
    Operation::requires("members.create", Feature::Users, Action::Write);
pub const UPDATE_MEMBER: Operation =
    Operation::requires("members.update", Feature::Users, Action::Write);
pub const DELETE_MEMBER: Operation =
    Operation::requires("members.delete", Feature::Users, Action::Delete);
