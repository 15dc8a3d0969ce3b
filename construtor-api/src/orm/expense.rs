use chrono::Utc;
use diesel::prelude::*;

use crate::models::{Expense, ExpenseChanges, NewExpense, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_expense(
    conn: &mut SqliteConnection,
    new_expense: NewExpense,
    acting_user_id: Option<i32>,
) -> Result<Expense, diesel::result::Error> {
    use crate::schema::expenses::dsl::*;

    diesel::insert_into(expenses).values(&new_expense).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let expense = expenses.filter(id.eq(last_id)).select(Expense::as_select()).first(conn)?;

    stamp_user(conn, "expenses", expense.id, "create", acting_user_id);
    Ok(expense)
}

pub fn get_expense(
    conn: &mut SqliteConnection,
    expense_id: i32,
) -> Result<Option<Expense>, diesel::result::Error> {
    use crate::schema::expenses::dsl::*;
    expenses
        .filter(id.eq(expense_id))
        .filter(deleted_at.is_null())
        .select(Expense::as_select())
        .first(conn)
        .optional()
}

pub fn get_expense_with_timestamps(
    conn: &mut SqliteConnection,
    expense_id: i32,
) -> Result<Option<Timestamped<Expense>>, diesel::result::Error> {
    match get_expense(conn, expense_id)? {
        Some(expense) => with_timestamps(conn, "expenses", expense_id, expense).map(Some),
        None => Ok(None),
    }
}

/// Lists live expenses, most recent spending first.
pub fn list_expenses(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    obra_filter: Option<i32>,
    category_filter: Option<&str>,
    page: Page,
) -> Result<Vec<Expense>, diesel::result::Error> {
    use crate::schema::expenses::dsl::*;

    let mut query = expenses.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(wanted) = obra_filter {
        query = query.filter(obra_id.eq(wanted));
    }
    if let Some(wanted) = category_filter {
        query = query.filter(category.eq(wanted.to_string()));
    }

    query
        .order((spent_on.desc(), id.desc()))
        .limit(page.limit)
        .offset(page.offset)
        .select(Expense::as_select())
        .load(conn)
}

pub fn update_expense(
    conn: &mut SqliteConnection,
    expense_id: i32,
    changes: ExpenseChanges,
    acting_user_id: Option<i32>,
) -> Result<Expense, diesel::result::Error> {
    use crate::schema::expenses::dsl::*;

    let current = get_expense(conn, expense_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(expenses.filter(id.eq(expense_id)))
        .set((
            description.eq(changes.description.unwrap_or(current.description)),
            category.eq(changes.category.unwrap_or(current.category)),
            amount_cents.eq(changes.amount_cents.unwrap_or(current.amount_cents)),
            spent_on.eq(changes.spent_on.unwrap_or(current.spent_on)),
            supplier_name.eq(changes.supplier_name.or(current.supplier_name)),
            supplier_document.eq(changes.supplier_document.or(current.supplier_document)),
        ))
        .execute(conn)?;

    let expense = expenses.filter(id.eq(expense_id)).select(Expense::as_select()).first(conn)?;
    stamp_user(conn, "expenses", expense_id, "update", acting_user_id);
    Ok(expense)
}

pub fn soft_delete_expense(
    conn: &mut SqliteConnection,
    expense_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::expenses::dsl::*;

    let result = diesel::update(expenses.filter(id.eq(expense_id)).filter(deleted_at.is_null()))
        .set(deleted_at.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "expenses", expense_id, "delete", acting_user_id);
    }
    Ok(result)
}
