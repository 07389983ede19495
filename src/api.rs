use koho_api_client::{Bytes, ClientConfig, KohoClient, Request};
use koho_api_resources::{
    AccountingAssignment, AccountingTarget, Company, Contract, CustomReportMethods, Customer,
    CustomerCategory, CustomerFinancialStatement, CustomerGroup, Datafile, Employee,
    EmployeeProfile, EmployeeTeam, IncidentMethods, Invoice, Notification, Offer, Person,
    Product, ProductCatalog, Project, ProjectTask, ProjectTemplate, Resource, ResourceMethods,
    Result, Sale, WorkSession, WorkSessionAssignment, WorkSessionAssignmentTemplate,
    WorkSessionShift, WorkSessionShiftType,
};
use serde_json::Value;

/// Entry point to every Koho resource.
///
/// Cloning is cheap; all clones share one HTTP client.
#[derive(Debug, Clone)]
pub struct KohoApi {
    client: KohoClient,
}

impl KohoApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: KohoClient::new(config)?,
        })
    }

    /// Configure from `KOHO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: KohoClient::from_env()?,
        })
    }

    pub fn from_client(client: KohoClient) -> Self {
        Self { client }
    }

    /// The underlying HTTP client.
    pub fn client(&self) -> &KohoClient {
        &self.client
    }

    /// CRUD methods for any resource type.
    pub fn resource<R: Resource>(&self) -> ResourceMethods<R> {
        ResourceMethods::new(self.client.clone())
    }

    pub fn accounting_targets(&self) -> ResourceMethods<AccountingTarget> {
        self.resource()
    }

    pub fn accounting_assignments(&self) -> ResourceMethods<AccountingAssignment> {
        self.resource()
    }

    pub fn companies(&self) -> ResourceMethods<Company> {
        self.resource()
    }

    pub fn contracts(&self) -> ResourceMethods<Contract> {
        self.resource()
    }

    pub fn custom_reports(&self) -> CustomReportMethods {
        CustomReportMethods::new(self.client.clone())
    }

    pub fn customers(&self) -> ResourceMethods<Customer> {
        self.resource()
    }

    pub fn customer_categories(&self) -> ResourceMethods<CustomerCategory> {
        self.resource()
    }

    pub fn customer_groups(&self) -> ResourceMethods<CustomerGroup> {
        self.resource()
    }

    pub fn customer_financial_statements(&self) -> ResourceMethods<CustomerFinancialStatement> {
        self.resource()
    }

    pub fn datafiles(&self) -> ResourceMethods<Datafile> {
        self.resource()
    }

    pub fn employees(&self) -> ResourceMethods<Employee> {
        self.resource()
    }

    pub fn employee_teams(&self) -> ResourceMethods<EmployeeTeam> {
        self.resource()
    }

    pub fn employee_profiles(&self) -> ResourceMethods<EmployeeProfile> {
        self.resource()
    }

    pub fn incidents(&self) -> IncidentMethods {
        IncidentMethods::new(self.client.clone())
    }

    pub fn invoices(&self) -> ResourceMethods<Invoice> {
        self.resource()
    }

    pub fn notifications(&self) -> ResourceMethods<Notification> {
        self.resource()
    }

    pub fn offers(&self) -> ResourceMethods<Offer> {
        self.resource()
    }

    pub fn persons(&self) -> ResourceMethods<Person> {
        self.resource()
    }

    pub fn products(&self) -> ResourceMethods<Product> {
        self.resource()
    }

    pub fn product_catalogs(&self) -> ResourceMethods<ProductCatalog> {
        self.resource()
    }

    pub fn projects(&self) -> ResourceMethods<Project> {
        self.resource()
    }

    pub fn project_tasks(&self) -> ResourceMethods<ProjectTask> {
        self.resource()
    }

    pub fn project_templates(&self) -> ResourceMethods<ProjectTemplate> {
        self.resource()
    }

    pub fn sales(&self) -> ResourceMethods<Sale> {
        self.resource()
    }

    pub fn work_sessions(&self) -> ResourceMethods<WorkSession> {
        self.resource()
    }

    pub fn work_session_assignments(&self) -> ResourceMethods<WorkSessionAssignment> {
        self.resource()
    }

    pub fn work_session_assignment_templates(
        &self,
    ) -> ResourceMethods<WorkSessionAssignmentTemplate> {
        self.resource()
    }

    pub fn work_session_shifts(&self) -> ResourceMethods<WorkSessionShift> {
        self.resource()
    }

    pub fn work_session_shift_types(&self) -> ResourceMethods<WorkSessionShiftType> {
        self.resource()
    }

    /// Send a request outside the typed resources and return the JSON payload.
    pub async fn request(&self, request: Request) -> Result<Value> {
        Ok(self.client.request(request).await?)
    }

    pub async fn request_text(&self, request: Request) -> Result<String> {
        Ok(self.client.request_text(request).await?)
    }

    /// Raw response body, e.g. datafile contents.
    pub async fn request_buffer(&self, request: Request) -> Result<Bytes> {
        Ok(self.client.request_buffer(request).await?)
    }
}
