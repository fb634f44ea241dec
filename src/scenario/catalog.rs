//! Built-in scenarios for the VPC and subnet lifecycle.

use thiserror::Error;

use crate::classify::{ExpectedStatus, IdentifierFormat};
use crate::config::HarnessConfig;

use super::{BulkParameters, Operation, Scenario};

/// Name of the create-VPC scenario.
pub const CREATE_VPC: &str = "create-vpc";
/// Name of the create-subnet scenario.
pub const CREATE_SUBNET: &str = "create-subnet";
/// Name of the delete-VPC scenario.
pub const DELETE_VPC: &str = "delete-vpc";
/// Name of the delete-subnet scenario.
pub const DELETE_SUBNET: &str = "delete-subnet";

/// Errors raised while resolving a scenario by name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CatalogError {
    /// No built-in scenario carries this name.
    #[error("unknown scenario '{0}' (expected one of: create-vpc, create-subnet, delete-vpc, delete-subnet)")]
    UnknownScenario(String),
    /// A create scenario was requested without a field table.
    #[error("scenario '{0}' needs a field table (--fields)")]
    MissingFields(String),
    /// A delete scenario was requested without a target id.
    #[error("scenario '{0}' needs a target id (--target-id)")]
    MissingTarget(String),
}

/// Creates a VPC and requires a well-formed VPC id in the response.
#[must_use]
pub fn create_vpc(fields: impl Into<String>) -> Scenario {
    Scenario::new(CREATE_VPC, Operation::CreateVpc)
        .fields(fields)
        .require_identifier(Some(IdentifierFormat::VPC))
        .with_health_probe()
}

/// Creates a subnet and requires an id in the response.
#[must_use]
pub fn create_subnet(fields: impl Into<String>) -> Scenario {
    Scenario::new(CREATE_SUBNET, Operation::CreateSubnet)
        .fields(fields)
        .require_identifier(None)
        .with_health_probe()
}

/// Deletes a VPC using the configured account, provider, and region.
#[must_use]
pub fn delete_vpc(id: impl Into<String>, config: &HarnessConfig) -> Scenario {
    Scenario::new(DELETE_VPC, Operation::DeleteVpc { id: id.into() })
        .fields(delete_fields(config))
        .expect_status(ExpectedStatus::only(200))
}

/// Deletes a subnet using the configured account, provider, and region.
#[must_use]
pub fn delete_subnet(id: impl Into<String>, config: &HarnessConfig) -> Scenario {
    Scenario::new(DELETE_SUBNET, Operation::DeleteSubnet { id: id.into() })
        .fields(delete_fields(config))
        .expect_status(ExpectedStatus::only(200))
}

/// The fixed scenario a bulk run repeats. Identifiers are recovered on a
/// best-effort basis so API success and id recovery are reported separately.
#[must_use]
pub fn bulk_create(operation: Operation) -> Scenario {
    let format = matches!(operation, Operation::CreateVpc).then_some(IdentifierFormat::VPC);
    let name = match operation {
        Operation::CreateSubnet => CREATE_SUBNET,
        _ => CREATE_VPC,
    };
    Scenario::new(name, operation)
        .recover_identifier(format)
        .with_health_probe()
}

/// Resolves a built-in scenario by name.
///
/// # Errors
///
/// Returns [`CatalogError`] when the name is unknown or a required input is
/// missing.
pub fn lookup(
    name: &str,
    fields: Option<String>,
    target_id: Option<&str>,
    config: &HarnessConfig,
) -> Result<Scenario, CatalogError> {
    match name {
        CREATE_VPC => fields
            .map(create_vpc)
            .ok_or_else(|| CatalogError::MissingFields(name.to_owned())),
        CREATE_SUBNET => fields
            .map(create_subnet)
            .ok_or_else(|| CatalogError::MissingFields(name.to_owned())),
        DELETE_VPC | DELETE_SUBNET => {
            let id = target_id.ok_or_else(|| CatalogError::MissingTarget(name.to_owned()))?;
            let scenario = if name == DELETE_VPC {
                delete_vpc(id, config)
            } else {
                delete_subnet(id, config)
            };
            Ok(match fields {
                Some(table) => scenario.fields(table),
                None => scenario,
            })
        }
        other => Err(CatalogError::UnknownScenario(other.to_owned())),
    }
}

fn delete_fields(config: &HarnessConfig) -> String {
    format!(
        "cloudAccountId={}\ncloudProvider={}\ncloudRegion={}\ncloudResourceGroup=",
        config.cloud_account_id, config.cloud_provider, config.cloud_region
    )
}

/// Field table used for one bulk iteration.
pub(super) fn bulk_fields(
    operation: &Operation,
    params: &BulkParameters,
    config: &HarnessConfig,
) -> Option<String> {
    let common = format!(
        "cloudAccountId={}\ncloudProvider={}\ncloudRegion={}\ncloudResourceGroup=",
        config.cloud_account_id, config.cloud_provider, config.cloud_region
    );
    match operation {
        Operation::CreateVpc => Some(format!(
            "cidrBlock={cidr}\n{common}\nname={name}\nstackName={stack}\ntagName={name}",
            cidr = params.primary_value,
            name = params.resource_name,
            stack = params.stack_name,
        )),
        Operation::CreateSubnet => Some(format!(
            "{common}\nstackName={stack}\nsubnetCidr={cidr}\nvpcId={vpc}\nname={name}",
            stack = params.stack_name,
            cidr = params.primary_value,
            vpc = params.parent_id.as_deref().unwrap_or_default(),
            name = params.resource_name,
        )),
        Operation::DeleteVpc { .. } | Operation::DeleteSubnet { .. } => None,
    }
}
