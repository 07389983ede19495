//! Customers and their related records.

use koho_api_client::{QueryParams, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::resource::{wrap_body, Resource, ResourceMethods};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::de::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    /// Contact persons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons: Option<Vec<Person>>,
    /// Responsible employees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// Returns true unless the customer is archived.
    pub fn is_active(&self) -> bool {
        self.archived != Some(true)
    }
}

impl Resource for Customer {
    const PATH: &'static str = "customers";
    const BODY_KEY: &'static str = "customer";
}

/// Contact person of a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Person {
    const PATH: &'static str = "persons";
    const BODY_KEY: &'static str = "person";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for CustomerCategory {
    const PATH: &'static str = "customer_categories";
    const BODY_KEY: &'static str = "customer_category";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for CustomerGroup {
    const PATH: &'static str = "customer_groups";
    const BODY_KEY: &'static str = "customer_group";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerFinancialStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for CustomerFinancialStatement {
    const PATH: &'static str = "customer_financial_statements";
    const BODY_KEY: &'static str = "customer_financial_statement";
}

impl ResourceMethods<Customer> {
    /// Customers with the given name. Names are not unique.
    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str, active_only: bool) -> Result<Vec<Customer>> {
        let customers = self.get_all(QueryParams::from([("name", name)])).await?;
        Ok(filter_active(customers, active_only))
    }

    /// Customers with the given number. Numbers are not unique.
    #[instrument(skip(self))]
    pub async fn get_by_number(&self, number: &str, active_only: bool) -> Result<Vec<Customer>> {
        let customers = self.get_all(QueryParams::from([("number", number)])).await?;
        Ok(filter_active(customers, active_only))
    }

    /// All customers that are not archived.
    pub async fn get_active(&self, params: QueryParams) -> Result<Vec<Customer>> {
        let customers = self.get_all(params).await?;
        Ok(filter_active(customers, true))
    }

    /// Save a customer, including its persons and responsible employees.
    ///
    /// Fails with `InvalidInput` if the customer has no id.
    #[instrument(skip(self, customer), fields(id = ?customer.id))]
    pub async fn update(&self, customer: &Customer) -> Result<()> {
        let id = customer
            .id
            .ok_or_else(|| Error::invalid_input("Cannot update customer: no id specified"))?;
        let body = wrap_body(Customer::BODY_KEY, update_properties(customer)?);

        self.client()
            .request(Request::put(self.url(&id.to_string())).body(body))
            .await?;
        Ok(())
    }
}

fn filter_active(customers: Vec<Customer>, active_only: bool) -> Vec<Customer> {
    if !active_only {
        return customers;
    }
    customers.into_iter().filter(Customer::is_active).collect()
}

/// Reshape a customer into the nested-attributes form the update endpoint takes.
///
/// `persons` becomes `persons_attributes` without access tokens and
/// `employees` becomes `responsibilities_attributes`. Empty lists are left out.
fn update_properties(customer: &Customer) -> Result<Value> {
    let mut properties = match serde_json::to_value(customer)? {
        Value::Object(map) => map,
        other => return Err(Error::invalid_input(format!("customer is not an object: {other}"))),
    };

    if let Some(Value::Array(mut persons)) = properties.remove("persons") {
        if !persons.is_empty() {
            for person in &mut persons {
                if let Value::Object(person) = person {
                    person.remove("customer_access_tokens");
                }
            }
            properties.insert("persons_attributes".to_string(), Value::Array(persons));
        }
    }

    if let Some(Value::Array(employees)) = properties.remove("employees") {
        if !employees.is_empty() {
            properties.insert(
                "responsibilities_attributes".to_string(),
                Value::Array(employees),
            );
        }
    }

    Ok(Value::Object(properties))
}
