//! API endpoints for obra expenses. Amounts are integer cents.

use chrono::NaiveDate;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, bad_request, not_found, storage_error};
use crate::api::{ensure_readable, ensure_same_org, ensure_writable, invalid, visible_obra};
use crate::logged_json::LoggedJson;
use crate::models::{Expense, ExpenseCategory, ExpenseChanges, NewExpense, Timestamped};
use crate::normalize::{changed_text, optional_document, optional_text, parse_optional, required_text};
use crate::orm::expense::{
    get_expense, get_expense_with_timestamps, insert_expense, list_expenses, soft_delete_expense,
    update_expense,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateExpenseRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "obraId")]
    pub obra_id: i32,
    #[serde(alias = "descricao")]
    pub description: String,
    #[serde(alias = "categoria")]
    pub category: ExpenseCategory,
    #[serde(alias = "valor_centavos", alias = "amountCents")]
    pub amount_cents: i64,
    #[serde(alias = "data_gasto", alias = "spentOn")]
    pub spent_on: NaiveDate,
    #[serde(alias = "fornecedor", alias = "supplierName")]
    pub supplier_name: Option<String>,
    /// CPF or CNPJ of the supplier.
    #[serde(alias = "fornecedor_documento", alias = "supplierDocument")]
    pub supplier_document: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateExpenseRequest {
    #[serde(alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<ExpenseCategory>,
    #[serde(alias = "valor_centavos", alias = "amountCents")]
    pub amount_cents: Option<i64>,
    #[serde(alias = "data_gasto", alias = "spentOn")]
    pub spent_on: Option<NaiveDate>,
    #[serde(alias = "fornecedor", alias = "supplierName")]
    pub supplier_name: Option<String>,
    #[serde(alias = "fornecedor_documento", alias = "supplierDocument")]
    pub supplier_document: Option<String>,
}

fn check_amount(amount_cents: i64) -> ApiResult<()> {
    if amount_cents > 0 {
        Ok(())
    } else {
        Err(bad_request("amount_cents must be greater than zero"))
    }
}

fn load_expense(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    expense_id: i32,
) -> ApiResult<Expense> {
    let expense = get_expense(conn, expense_id)
        .map_err(|e| storage_error("Loading expense", e))?
        .ok_or_else(|| not_found("Expense"))?;
    ensure_writable(auth_user, expense.org_id, "Expense")?;
    Ok(expense)
}

/// Create Expense endpoint.
///
/// ```json
/// {
///   "obra_id": 3,
///   "description": "Cimento CP-II 50kg",
///   "category": "material",
///   "amount_cents": 389000,
///   "spent_on": "2025-03-12",
///   "supplier_document": "11.222.333/0001-81"
/// }
/// ```
#[post("/expenses", data = "<new_expense>")]
pub async fn create_expense(
    _rate: RateLimited,
    db: DbConn,
    new_expense: LoggedJson<CreateExpenseRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Expense>>> {
    let request = new_expense.into_inner();
    let description = invalid(required_text("description", &request.description))?;
    check_amount(request.amount_cents)?;
    let supplier_document = invalid(optional_document("supplier_document", request.supplier_document))?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let obra = visible_obra(conn, &auth_user, request.obra_id)?;
        ensure_same_org(request.org_id, obra.org_id, "Obra")?;
        ensure_writable(&auth_user, obra.org_id, "Expense")?;

        let expense = insert_expense(
            conn,
            NewExpense {
                org_id: obra.org_id,
                obra_id: obra.id,
                description,
                category: request.category.as_str().to_string(),
                amount_cents: request.amount_cents,
                spent_on: request.spent_on,
                supplier_name: optional_text(request.supplier_name),
                supplier_document,
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating expense", e))?;

        info!(
            "Expense {} of {} cents on obra {} recorded by user {}",
            expense.id, expense.amount_cents, obra.id, acting
        );
        Ok(status::Created::new(format!("/api/expenses/{}", expense.id)).body(Json(expense)))
    })
    .await
}

/// List Expenses endpoint, most recent spending first.
///
/// - **URL:** `/api/expenses?obra_id=3&category=material`
#[get("/expenses?<obra_id>&<category>&<limit>&<offset>")]
pub async fn list_expenses_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    obra_id: Option<i32>,
    category: Option<&str>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Expense>>> {
    let category = invalid(parse_optional::<ExpenseCategory>(category))?;
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_expenses(conn, scope, obra_id, category.as_ref().map(ExpenseCategory::as_str), page)
            .map(Json)
            .map_err(|e| storage_error("Listing expenses", e))
    })
    .await
}

#[get("/expenses/<expense_id>")]
pub async fn get_expense_endpoint(
    _rate: RateLimited,
    db: DbConn,
    expense_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Expense>>> {
    db.run(move |conn| -> ApiResult<_> {
        let expense = get_expense_with_timestamps(conn, expense_id)
            .map_err(|e| storage_error("Loading expense", e))?
            .ok_or_else(|| not_found("Expense"))?;
        ensure_readable(&auth_user, expense.entity.org_id, "Expense")?;
        Ok(Json(expense))
    })
    .await
}

#[put("/expenses/<expense_id>", data = "<changes>")]
pub async fn update_expense_endpoint(
    _rate: RateLimited,
    db: DbConn,
    expense_id: i32,
    changes: LoggedJson<UpdateExpenseRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Expense>> {
    let request = changes.into_inner();
    if let Some(amount) = request.amount_cents {
        check_amount(amount)?;
    }
    let changes = ExpenseChanges {
        description: invalid(changed_text("description", request.description))?,
        category: request.category.map(|c| c.as_str().to_string()),
        amount_cents: request.amount_cents,
        spent_on: request.spent_on,
        supplier_name: optional_text(request.supplier_name),
        supplier_document: invalid(optional_document("supplier_document", request.supplier_document))?,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        load_expense(conn, &auth_user, expense_id)?;
        update_expense(conn, expense_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating expense", e))
    })
    .await
}

#[delete("/expenses/<expense_id>")]
pub async fn delete_expense(
    _rate: RateLimited,
    db: DbConn,
    expense_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        load_expense(conn, &auth_user, expense_id)?;
        match soft_delete_expense(conn, expense_id, Some(acting)) {
            Ok(0) => Err(not_found("Expense")),
            Ok(_) => {
                info!("Expense {} deleted by user {}", expense_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting expense", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_expense,
        list_expenses_endpoint,
        get_expense_endpoint,
        update_expense_endpoint,
        delete_expense
    ]
}
