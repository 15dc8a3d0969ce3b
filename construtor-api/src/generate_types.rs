//! TypeScript type generation.
//!
//! Exports the definitions of every request and response type annotated
//! with `#[ts(export)]` for the front end. Runs as a test.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        // Output directory, in order of preference:
        // 1. CONSTRUTOR_TS_OUTPUT_DIR
        // 2. ../../web/src/types/generated (if the web project is checked out)
        // 3. ../ts-bindings
        let output_dir_str = if let Ok(env_dir) = env::var("CONSTRUTOR_TS_OUTPUT_DIR") {
            println!("Using TypeScript output directory from CONSTRUTOR_TS_OUTPUT_DIR: {}", env_dir);
            env_dir
        } else {
            let web_dir = "../../web/src/types/generated";
            let fallback_dir = "../ts-bindings";

            if Path::new(web_dir).parent().unwrap_or(Path::new("")).exists() {
                println!("Using web project directory: {}", web_dir);
                web_dir.to_string()
            } else {
                println!("Using fallback directory: {}", fallback_dir);
                fallback_dir.to_string()
            }
        };

        let output_dir = Path::new(&output_dir_str);
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Remove stale definitions so renamed types leave nothing behind
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path)
                    .unwrap_or_else(|e| panic!("Failed to remove {:?}: {}", path, e));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        use crate::api::{
            attachment::{CreateAttachmentRequest, UpdateAttachmentRequest},
            checklist::{
                CreateChecklistItemRequest, CreateChecklistRequest, UpdateChecklistItemRequest,
                UpdateChecklistRequest,
            },
            equipamento::{CreateEquipamentoRequest, UpdateEquipamentoRequest},
            equipe::{CreateEquipeRequest, UpdateEquipeRequest},
            error::ErrorResponse,
            expense::{CreateExpenseRequest, UpdateExpenseRequest},
            login::{LoginRequest, LoginSuccessResponse},
            obra::{CreateObraRequest, UpdateObraRequest},
            org::{CreateOrgRequest, UpdateOrgRequest},
            rdo::{CreateRdoRequest, RdoStatusRequest, UpdateRdoRequest},
            rdo_item::{CreateRdoItemRequest, UpdateRdoItemRequest},
            status::HealthStatus,
            user::{CreateUserRequest, RoleAssignmentRequest, UpdateUserRequest},
            validation::{DocumentValidation, PasswordCheckRequest, PasswordCheckResponse},
        };
        use crate::models::*;

        // Models
        Org::export().expect("Failed to export Org type");
        User::export().expect("Failed to export User type");
        UserWithRoles::export().expect("Failed to export UserWithRoles type");
        Role::export().expect("Failed to export Role type");
        NewRole::export().expect("Failed to export NewRole type");
        Obra::export().expect("Failed to export Obra type");
        ObraStatus::export().expect("Failed to export ObraStatus type");
        ObraSummary::export().expect("Failed to export ObraSummary type");
        Equipe::export().expect("Failed to export Equipe type");
        Equipamento::export().expect("Failed to export Equipamento type");
        EquipamentoStatus::export().expect("Failed to export EquipamentoStatus type");
        Ownership::export().expect("Failed to export Ownership type");
        Rdo::export().expect("Failed to export Rdo type");
        RdoStatus::export().expect("Failed to export RdoStatus type");
        RdoItem::export().expect("Failed to export RdoItem type");
        Attachment::export().expect("Failed to export Attachment type");
        AttachmentEntityType::export().expect("Failed to export AttachmentEntityType type");
        Checklist::export().expect("Failed to export Checklist type");
        ChecklistItem::export().expect("Failed to export ChecklistItem type");
        ChecklistWithItems::export().expect("Failed to export ChecklistWithItems type");
        Expense::export().expect("Failed to export Expense type");
        ExpenseCategory::export().expect("Failed to export ExpenseCategory type");
        EntityActivity::export().expect("Failed to export EntityActivity type");

        // Shared
        ErrorResponse::export().expect("Failed to export ErrorResponse type");
        HealthStatus::export().expect("Failed to export HealthStatus type");

        // Auth
        LoginRequest::export().expect("Failed to export LoginRequest type");
        LoginSuccessResponse::export().expect("Failed to export LoginSuccessResponse type");

        // Requests
        CreateOrgRequest::export().expect("Failed to export CreateOrgRequest type");
        UpdateOrgRequest::export().expect("Failed to export UpdateOrgRequest type");
        CreateUserRequest::export().expect("Failed to export CreateUserRequest type");
        UpdateUserRequest::export().expect("Failed to export UpdateUserRequest type");
        RoleAssignmentRequest::export().expect("Failed to export RoleAssignmentRequest type");
        CreateObraRequest::export().expect("Failed to export CreateObraRequest type");
        UpdateObraRequest::export().expect("Failed to export UpdateObraRequest type");
        CreateEquipeRequest::export().expect("Failed to export CreateEquipeRequest type");
        UpdateEquipeRequest::export().expect("Failed to export UpdateEquipeRequest type");
        CreateEquipamentoRequest::export().expect("Failed to export CreateEquipamentoRequest type");
        UpdateEquipamentoRequest::export().expect("Failed to export UpdateEquipamentoRequest type");
        CreateRdoRequest::export().expect("Failed to export CreateRdoRequest type");
        UpdateRdoRequest::export().expect("Failed to export UpdateRdoRequest type");
        RdoStatusRequest::export().expect("Failed to export RdoStatusRequest type");
        CreateRdoItemRequest::export().expect("Failed to export CreateRdoItemRequest type");
        UpdateRdoItemRequest::export().expect("Failed to export UpdateRdoItemRequest type");
        CreateAttachmentRequest::export().expect("Failed to export CreateAttachmentRequest type");
        UpdateAttachmentRequest::export().expect("Failed to export UpdateAttachmentRequest type");
        CreateChecklistRequest::export().expect("Failed to export CreateChecklistRequest type");
        UpdateChecklistRequest::export().expect("Failed to export UpdateChecklistRequest type");
        CreateChecklistItemRequest::export()
            .expect("Failed to export CreateChecklistItemRequest type");
        UpdateChecklistItemRequest::export()
            .expect("Failed to export UpdateChecklistItemRequest type");
        CreateExpenseRequest::export().expect("Failed to export CreateExpenseRequest type");
        UpdateExpenseRequest::export().expect("Failed to export UpdateExpenseRequest type");

        // Validators
        DocumentValidation::export().expect("Failed to export DocumentValidation type");
        PasswordCheckRequest::export().expect("Failed to export PasswordCheckRequest type");
        PasswordCheckResponse::export().expect("Failed to export PasswordCheckResponse type");

        println!("TypeScript types generated successfully in {:?}", output_dir);
    }
}
