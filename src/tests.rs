#[cfg(test)]
mod integration_tests {
    use crate::test_utils::test_utils::{
        ADMIN_PASSWORD, ADMIN_USERNAME, admin_token, login, register_student_account,
        setup_test_app, setup_test_app_with_state,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use chrono::Utc;
    use model::entities::{prelude::*, student, user};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
    use serde_json::{Value, json};
    use std::str::FromStr;

    async fn create_student_via_api(
        server: &TestServer,
        token: &str,
        enrollment: &str,
        email: &str,
        branch: &str,
        cgpa: &str,
        is_placed: bool,
    ) -> Value {
        let response = server
            .post("/api/students")
            .authorization_bearer(token)
            .json(&json!({
                "enrollment_number": enrollment,
                "name": format!("Student {}", enrollment),
                "email": email,
                "phone": "9999999999",
                "branch": branch,
                "year": "4",
                "cgpa": cgpa,
                "skills": "rust,sql",
                "is_placed": is_placed,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["data"].clone()
    }

    async fn create_company_via_api(
        server: &TestServer,
        token: &str,
        name: &str,
        package: &str,
        is_active: bool,
    ) -> Value {
        let response = server
            .post("/api/companies")
            .authorization_bearer(token)
            .json(&json!({
                "name": name,
                "description": "A test company",
                "company_type": "PRODUCT",
                "package_offered": package,
                "min_cgpa_required": "7.00",
                "eligible_branches": "CSE,ECE",
                "job_role": "Software Engineer",
                "is_active": is_active,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_api_root_and_favicon() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["endpoints"]["students"], "/api/students/");

        let favicon = server.get("/favicon.ico").await;
        favicon.assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "asha",
                "email": "asha@college.edu",
                "password": "password-123",
                "password2": "password-123",
                "first_name": "Asha",
                "last_name": "Rao",
                "role": "STUDENT",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["user"]["username"], "asha");
        assert_eq!(body["data"]["user"]["role"], "STUDENT");
        assert_eq!(body["data"]["user"]["is_verified"], false);
        assert!(body["data"]["tokens"]["access"].as_str().is_some());
        assert!(body["data"]["tokens"]["refresh"].as_str().is_some());

        let (access, _refresh) = login(&server, "asha", "password-123").await;
        let profile = server
            .get("/api/auth/profile")
            .authorization_bearer(&access)
            .await;
        profile.assert_status(StatusCode::OK);
        let profile_body: Value = profile.json();
        assert_eq!(profile_body["data"]["email"], "asha@college.edu");
    }

    #[tokio::test]
    async fn test_register_password_mismatch_creates_no_user() {
        let (app, state) = setup_test_app_with_state().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "mismatch",
                "email": "mismatch@college.edu",
                "password": "password-123",
                "password2": "password-456",
                "first_name": "No",
                "last_name": "Body",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["success"], false);

        let count = User::find()
            .filter(user::Column::Username.eq("mismatch"))
            .count(&state.db)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_student_account(&server, "first", "dup@college.edu", "password-123").await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "second",
                "email": "dup@college.edu",
                "password": "password-123",
                "password2": "password-123",
                "first_name": "Dup",
                "last_name": "Email",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_wrong_password_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/login")
            .json(&json!({
                "username": ADMIN_USERNAME,
                "password": "not-the-password",
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_protected_routes_require_authentication() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        for path in [
            "/api/students",
            "/api/companies",
            "/api/stages",
            "/api/placement-progress",
            "/api/important-dates",
        ] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_student_crud() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let created = create_student_via_api(
            &server,
            &token,
            "EN2021CS001",
            "cs001@college.edu",
            "CSE",
            "8.75",
            false,
        )
        .await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["cgpa"], "8.75");
        // An account is provisioned alongside the profile
        assert!(created["user_id"].as_i64().is_some());

        let fetched = server
            .get(&format!("/api/students/{}", id))
            .authorization_bearer(&token)
            .await;
        fetched.assert_status(StatusCode::OK);

        let updated = server
            .put(&format!("/api/students/{}", id))
            .authorization_bearer(&token)
            .json(&json!({ "cgpa": "9.10", "is_placed": true }))
            .await;
        updated.assert_status(StatusCode::OK);
        let updated_body: Value = updated.json();
        assert_eq!(updated_body["data"]["cgpa"], "9.10");
        assert_eq!(updated_body["data"]["is_placed"], true);

        let placed = server
            .get("/api/students/placed_students")
            .authorization_bearer(&token)
            .await;
        placed.assert_status(StatusCode::OK);
        let placed_body: Value = placed.json();
        assert_eq!(placed_body["data"].as_array().unwrap().len(), 1);

        let deleted = server
            .delete(&format!("/api/students/{}", id))
            .authorization_bearer(&token)
            .await;
        deleted.assert_status(StatusCode::OK);

        let gone = server
            .get(&format!("/api/students/{}", id))
            .authorization_bearer(&token)
            .await;
        gone.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_student_cgpa_out_of_range_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let response = server
            .post("/api/students")
            .authorization_bearer(&token)
            .json(&json!({
                "enrollment_number": "EN2021CS002",
                "name": "Over Achiever",
                "email": "over@college.edu",
                "branch": "CSE",
                "year": "4",
                "cgpa": "10.50",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");

        // The same bound applies on update.
        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS003",
            "bounded@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let update = server
            .put(&format!("/api/students/{}", student["id"]))
            .authorization_bearer(&token)
            .json(&json!({"cgpa": "-0.01"}))
            .await;
        update.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_number_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        create_student_via_api(
            &server,
            &token,
            "EN2021CS003",
            "cs003@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;

        let response = server
            .post("/api/students")
            .authorization_bearer(&token)
            .json(&json!({
                "enrollment_number": "EN2021CS003",
                "name": "Same Number",
                "email": "other@college.edu",
                "branch": "ECE",
                "year": "3",
                "cgpa": "7.50",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_student_scoping_with_link_repair() {
        let (app, state) = setup_test_app_with_state().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        // A profile imported before the student registered: no user link yet.
        let now = Utc::now();
        let orphan = student::ActiveModel {
            user_id: Set(None),
            enrollment_number: Set("EN2021CS010".to_string()),
            name: Set("Meera Iyer".to_string()),
            email: Set("meera@college.edu".to_string()),
            phone: Set(String::new()),
            branch: Set("ECE".to_string()),
            year: Set("4".to_string()),
            cgpa: Set(Decimal::from_str("8.20").unwrap()),
            skills: Set(String::new()),
            is_placed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&state.db)
        .await
        .unwrap();

        // Another student the caller must not see.
        create_student_via_api(
            &server,
            &admin,
            "EN2021CS011",
            "other011@college.edu",
            "CSE",
            "7.00",
            false,
        )
        .await;

        let student_access =
            register_student_account(&server, "meera", "meera@college.edu", "password-123").await;

        let listed = server
            .get("/api/students")
            .authorization_bearer(&student_access)
            .await;
        listed.assert_status(StatusCode::OK);
        let listed_body: Value = listed.json();
        let rows = listed_body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["enrollment_number"], "EN2021CS010");

        // The fallback lookup wrote the link back.
        let repaired = Student::find_by_id(orphan.id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert!(repaired.user_id.is_some());

        // Foreign profiles read as missing, not forbidden.
        let other = Student::find()
            .filter(student::Column::EnrollmentNumber.eq("EN2021CS011"))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        let response = server
            .get(&format!("/api/students/{}", other.id))
            .authorization_bearer(&student_access)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_company_writes_forbidden_for_students() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let student_access =
            register_student_account(&server, "plain", "plain@college.edu", "password-123").await;

        let response = server
            .post("/api/companies")
            .authorization_bearer(&student_access)
            .json(&json!({
                "name": "Rogue Corp",
                "company_type": "STARTUP",
                "package_offered": "5.00",
                "min_cgpa_required": "6.00",
                "job_role": "Intern",
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn test_verify_user_requires_admin() {
        let (app, state) = setup_test_app_with_state().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let student_access =
            register_student_account(&server, "verifyme", "verifyme@college.edu", "password-123")
                .await;
        let target = User::find()
            .filter(user::Column::Username.eq("verifyme"))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();

        // A student cannot verify accounts, not even their own.
        let denied = server
            .post(&format!("/api/auth/users/{}/verify", target.id))
            .authorization_bearer(&student_access)
            .await;
        denied.assert_status(StatusCode::FORBIDDEN);
        let unchanged = User::find_by_id(target.id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert!(!unchanged.is_verified);

        let verified = server
            .post(&format!("/api/auth/users/{}/verify", target.id))
            .authorization_bearer(&admin)
            .await;
        verified.assert_status(StatusCode::OK);
        let body: Value = verified.json();
        assert_eq!(body["data"]["is_verified"], true);
    }

    #[tokio::test]
    async fn test_user_list_scoped_to_caller() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let admin = admin_token(&server).await;

        let student_access =
            register_student_account(&server, "lister", "lister@college.edu", "password-123")
                .await;

        // Admin sees both accounts.
        let all = server
            .get("/api/auth/users")
            .authorization_bearer(&admin)
            .await;
        all.assert_status(StatusCode::OK);
        let all_body: Value = all.json();
        assert_eq!(all_body["data"].as_array().unwrap().len(), 2);

        // The student sees only their own account.
        let own = server
            .get("/api/auth/users")
            .authorization_bearer(&student_access)
            .await;
        own.assert_status(StatusCode::OK);
        let own_body: Value = own.json();
        let rows = own_body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "lister");
    }

    #[tokio::test]
    async fn test_duplicate_application_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS020",
            "cs020@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Acme", "10.00", true).await;

        let request = json!({
            "student_id": student["id"],
            "company_id": company["id"],
            "application_date": "2026-08-01",
        });
        let first = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&request)
            .await;
        first.assert_status(StatusCode::CREATED);

        let second = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&request)
            .await;
        second.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = second.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_application_fk_prechecks() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let response = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": 9999,
                "company_id": 9999,
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("student with id 9999"));
    }

    #[tokio::test]
    async fn test_duplicate_stage_record_rejected() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS021",
            "cs021@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Globex", "15.00", true).await;

        let stage = server
            .post("/api/stages")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Aptitude Test",
                "stage_type": "APTITUDE",
                "sequence_order": 2,
            }))
            .await;
        stage.assert_status(StatusCode::CREATED);
        let stage_body: Value = stage.json();

        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);
        let progress_body: Value = progress.json();

        let request = json!({
            "placement_progress_id": progress_body["data"]["id"],
            "stage_id": stage_body["data"]["id"],
            "result": "CLEARED",
        });
        let first = server
            .post("/api/stage-progress")
            .authorization_bearer(&token)
            .json(&request)
            .await;
        first.assert_status(StatusCode::CREATED);

        let second = server
            .post("/api/stage-progress")
            .authorization_bearer(&token)
            .json(&request)
            .await;
        second.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_statistics() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let placed = create_student_via_api(
            &server,
            &token,
            "EN2021CS030",
            "cs030@college.edu",
            "CSE",
            "9.00",
            true,
        )
        .await;
        create_student_via_api(
            &server,
            &token,
            "EN2021EC031",
            "ec031@college.edu",
            "ECE",
            "7.50",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Initech", "12.00", true).await;
        create_company_via_api(&server, &token, "Dormant Inc", "8.00", false).await;

        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": placed["id"],
                "company_id": company["id"],
                "status": "OFFER_ACCEPTED",
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);

        let response = server
            .get("/api/placement-progress/statistics")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let stats = &body["data"];
        assert_eq!(stats["total_students"], 2);
        assert_eq!(stats["placed_students"], 1);
        assert_eq!(stats["placement_percentage"], 50.0);
        // Only the active company counts.
        assert_eq!(stats["total_companies"], 1);
        assert_eq!(stats["total_applications"], 1);
        assert_eq!(stats["offers_accepted"], 1);
        assert_eq!(stats["average_package"], "12.00");
        assert_eq!(stats["status_breakdown"][0]["status"], "OFFER_ACCEPTED");
        assert_eq!(stats["branch_wise_placement"][0]["branch"], "CSE");
        assert_eq!(stats["branch_wise_placement"][0]["count"], 1);
    }

    #[tokio::test]
    async fn test_statistics_empty_database() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let response = server
            .get("/api/placement-progress/statistics")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["total_students"], 0);
        assert_eq!(body["data"]["placement_percentage"], 0.0);
        assert_eq!(body["data"]["average_package"], "0.00");
    }

    #[tokio::test]
    async fn test_csv_upload() {
        let (app, state) = setup_test_app_with_state().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let csv = "\
enrollment_number,name,email,phone,branch,year,cgpa,skills,is_placed
EN2021CS040,Rita Shah,rita@college.edu,9000000001,CSE,4,8.50,python,FALSE
EN2021CS041,Vik Nair,vik@college.edu,9000000002,CSE,4,7.25,java,TRUE
EN2021EC042,Anu Das,anu@college.edu,9000000003,ECE,3,9.00,,FALSE
,No Number,missing@college.edu,9000000004,CSE,4,8.00,,FALSE
";
        let part = Part::bytes(csv.as_bytes().to_vec())
            .file_name("students.csv")
            .mime_type("text/csv");
        let form = MultipartForm::new().add_part("file", part);

        let response = server
            .post("/api/students/upload_csv")
            .authorization_bearer(&token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["created"], 3);
        assert_eq!(body["data"]["updated"], 0);
        let errors = body["data"]["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().unwrap().starts_with("Row 5:"));

        let persisted = Student::find().count(&state.db).await.unwrap();
        assert_eq!(persisted, 3);

        // A re-upload of an existing row updates instead of duplicating.
        let update_csv = "\
enrollment_number,name,email,phone,branch,year,cgpa,skills,is_placed
EN2021CS040,Rita Shah,rita@college.edu,9000000001,CSE,4,8.90,python,TRUE
";
        let part = Part::bytes(update_csv.as_bytes().to_vec())
            .file_name("students.csv")
            .mime_type("text/csv");
        let second = server
            .post("/api/students/upload_csv")
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_part("file", part))
            .await;
        second.assert_status(StatusCode::OK);
        let second_body: Value = second.json();
        assert_eq!(second_body["data"]["created"], 0);
        assert_eq!(second_body["data"]["updated"], 1);

        let updated = Student::find()
            .filter(student::Column::EnrollmentNumber.eq("EN2021CS040"))
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_placed);
        assert_eq!(updated.cgpa, Decimal::from_str("8.90").unwrap());
    }

    #[tokio::test]
    async fn test_csv_upload_forbidden_for_students() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let student_access =
            register_student_account(&server, "uploader", "uploader@college.edu", "password-123")
                .await;

        let part = Part::bytes(b"enrollment_number,name\n".to_vec())
            .file_name("students.csv")
            .mime_type("text/csv");
        let response = server
            .post("/api/students/upload_csv")
            .authorization_bearer(&student_access)
            .multipart(MultipartForm::new().add_part("file", part))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_upcoming_dates() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let past = (Utc::now() - chrono::Duration::days(30)).to_rfc3339();
        let soon = (Utc::now() + chrono::Duration::days(7)).to_rfc3339();
        let later = (Utc::now() + chrono::Duration::days(14)).to_rfc3339();

        for (title, date, is_active) in [
            ("Last season drive", past.as_str(), true),
            ("Aptitude test", soon.as_str(), true),
            ("Cancelled interview", later.as_str(), false),
        ] {
            let response = server
                .post("/api/important-dates")
                .authorization_bearer(&token)
                .json(&json!({
                    "title": title,
                    "event_type": "DRIVE",
                    "event_date": date,
                    "is_active": is_active,
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/api/important-dates/upcoming")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Aptitude test");

        // The plain list still shows everything.
        let all = server
            .get("/api/important-dates")
            .authorization_bearer(&token)
            .await;
        let all_body: Value = all.json();
        assert_eq!(all_body["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_and_logout() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let (_access, refresh) = login(&server, ADMIN_USERNAME, ADMIN_PASSWORD).await;

        let refreshed = server
            .post("/api/auth/token/refresh")
            .json(&json!({ "refresh": refresh }))
            .await;
        refreshed.assert_status(StatusCode::OK);
        let body: Value = refreshed.json();
        assert!(body["data"]["access"].as_str().is_some());

        let logout = server
            .post("/api/auth/logout")
            .json(&json!({ "refresh": refresh }))
            .await;
        logout.assert_status(StatusCode::OK);

        let rejected = server
            .post("/api/auth/token/refresh")
            .json(&json!({ "refresh": refresh }))
            .await;
        rejected.assert_status(StatusCode::UNAUTHORIZED);
        let rejected_body: Value = rejected.json();
        assert_eq!(rejected_body["code"], "NOT_AUTHENTICATED");
    }

    #[tokio::test]
    async fn test_access_token_rejected_by_refresh_endpoint() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let (access, _refresh) = login(&server, ADMIN_USERNAME, ADMIN_PASSWORD).await;

        let response = server
            .post("/api/auth/token/refresh")
            .json(&json!({ "refresh": access }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        register_student_account(&server, "rotator", "rotator@college.edu", "password-123").await;
        let (access, _) = login(&server, "rotator", "password-123").await;

        let wrong = server
            .post("/api/auth/change-password")
            .authorization_bearer(&access)
            .json(&json!({
                "old_password": "not-right",
                "new_password": "password-456",
                "new_password2": "password-456",
            }))
            .await;
        wrong.assert_status(StatusCode::BAD_REQUEST);

        let mismatch = server
            .post("/api/auth/change-password")
            .authorization_bearer(&access)
            .json(&json!({
                "old_password": "password-123",
                "new_password": "password-456",
                "new_password2": "password-457",
            }))
            .await;
        mismatch.assert_status(StatusCode::BAD_REQUEST);

        // Neither failed attempt changed anything.
        login(&server, "rotator", "password-123").await;

        let changed = server
            .post("/api/auth/change-password")
            .authorization_bearer(&access)
            .json(&json!({
                "old_password": "password-123",
                "new_password": "password-456",
                "new_password2": "password-456",
            }))
            .await;
        changed.assert_status(StatusCode::OK);

        login(&server, "rotator", "password-456").await;
    }

    #[tokio::test]
    async fn test_my_progress() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS050",
            "cs050@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Hooli", "20.00", true).await;
        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);

        // The provisioned account logs in with the enrollment number.
        let (access, _) = login(&server, "en2021cs050", "EN2021CS050").await;
        let response = server
            .get("/api/placement-progress/my_progress")
            .authorization_bearer(&access)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(
            body["data"]["results"][0]["company_id"],
            company["id"]
        );

        // The admin account has no student profile.
        let admin_view = server
            .get("/api/placement-progress/my_progress")
            .authorization_bearer(&token)
            .await;
        admin_view.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_placement_history_scoped() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let first = create_student_via_api(
            &server,
            &token,
            "EN2021CS060",
            "cs060@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let second = create_student_via_api(
            &server,
            &token,
            "EN2021CS061",
            "cs061@college.edu",
            "CSE",
            "7.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Vandelay", "9.00", true).await;
        server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": first["id"],
                "company_id": company["id"],
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let (access, _) = login(&server, "en2021cs060", "EN2021CS060").await;
        let own = server
            .get(&format!("/api/students/{}/placement_history", first["id"]))
            .authorization_bearer(&access)
            .await;
        own.assert_status(StatusCode::OK);
        let own_body: Value = own.json();
        assert_eq!(own_body["data"].as_array().unwrap().len(), 1);

        let foreign = server
            .get(&format!("/api/students/{}/placement_history", second["id"]))
            .authorization_bearer(&access)
            .await;
        foreign.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stage_listing_ordered_by_sequence() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        for (name, stage_type, order) in [
            ("HR Round", "HR", 5),
            ("Application", "APPLICATION", 1),
            ("Technical Round 1", "TECHNICAL1", 3),
        ] {
            server
                .post("/api/stages")
                .authorization_bearer(&token)
                .json(&json!({
                    "name": name,
                    "stage_type": stage_type,
                    "sequence_order": order,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get("/api/stages")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Application", "Technical Round 1", "HR Round"]);
    }

    #[tokio::test]
    async fn test_clear_current_stage_with_null() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS070",
            "cs070@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Stark", "25.00", true).await;
        let stage = server
            .post("/api/stages")
            .authorization_bearer(&token)
            .json(&json!({
                "name": "Screening",
                "stage_type": "APPLICATION",
                "sequence_order": 1,
            }))
            .await;
        let stage_body: Value = stage.json();

        let created = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
                "current_stage_id": stage_body["data"]["id"],
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created_body: Value = created.json();
        let id = created_body["data"]["id"].as_i64().unwrap();
        assert!(!created_body["data"]["current_stage_id"].is_null());

        let cleared = server
            .put(&format!("/api/placement-progress/{}", id))
            .authorization_bearer(&token)
            .json(&json!({ "current_stage_id": null, "status": "REJECTED" }))
            .await;
        cleared.assert_status(StatusCode::OK);
        let cleared_body: Value = cleared.json();
        assert!(cleared_body["data"]["current_stage_id"].is_null());
        assert_eq!(cleared_body["data"]["status"], "REJECTED");
    }

    #[tokio::test]
    async fn test_company_applicants() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS080",
            "cs080@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Wayne", "18.00", true).await;
        server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("/api/companies/{}/applicants", company["id"].as_i64().unwrap()))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        // Students cannot see applicant lists.
        let (student_access, _) = login(&server, "en2021cs080", "EN2021CS080").await;
        let denied = server
            .get(&format!("/api/companies/{}/applicants", company["id"].as_i64().unwrap()))
            .authorization_bearer(&student_access)
            .await;
        denied.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_company_role_sees_no_students_or_progress() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS090",
            "cs090@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Vandelay", "9.00", true).await;
        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);

        let register = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "recruiter",
                "email": "recruiter@vandelay.example",
                "password": "password-123",
                "password2": "password-123",
                "first_name": "Art",
                "last_name": "V",
                "role": "COMPANY",
            }))
            .await;
        register.assert_status(StatusCode::CREATED);
        let (company_access, _) = login(&server, "recruiter", "password-123").await;

        for path in ["/api/students", "/api/placement-progress", "/api/stage-progress"] {
            let response = server.get(path).authorization_bearer(&company_access).await;
            response.assert_status(StatusCode::OK);
            let body: Value = response.json();
            assert_eq!(
                body["data"].as_array().unwrap().len(),
                0,
                "{} must be empty for a company account",
                path
            );
        }

        // Direct reads are out of scope too.
        let direct = server
            .get(&format!("/api/students/{}", student["id"]))
            .authorization_bearer(&company_access)
            .await;
        direct.assert_status(StatusCode::NOT_FOUND);
        let direct_progress = server
            .get(&format!("/api/placement-progress/{}", progress.json::<Value>()["data"]["id"]))
            .authorization_bearer(&company_access)
            .await;
        direct_progress.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_recent_updates_not_scoped_to_caller() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS091",
            "cs091@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Globex", "11.00", true).await;
        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);

        // A student with no applications of their own still sees the feed.
        let watcher =
            register_student_account(&server, "watcher", "watcher@college.edu", "password-123")
                .await;
        let response = server
            .get("/api/placement-progress/recent_updates")
            .authorization_bearer(&watcher)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["company_id"], company["id"]);
    }

    #[tokio::test]
    async fn test_stage_outcomes_listed_in_pipeline_order() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        let student = create_student_via_api(
            &server,
            &token,
            "EN2021CS092",
            "cs092@college.edu",
            "CSE",
            "8.00",
            false,
        )
        .await;
        let company = create_company_via_api(&server, &token, "Initrode", "10.00", true).await;
        let progress = server
            .post("/api/placement-progress")
            .authorization_bearer(&token)
            .json(&json!({
                "student_id": student["id"],
                "company_id": company["id"],
            }))
            .await;
        progress.assert_status(StatusCode::CREATED);
        let progress_id = progress.json::<Value>()["data"]["id"].clone();

        let mut stage_ids = Vec::new();
        for (name, sequence) in [("HR round", 3), ("Aptitude test", 1)] {
            let stage = server
                .post("/api/stages")
                .authorization_bearer(&token)
                .json(&json!({
                    "name": name,
                    "stage_type": "HR",
                    "sequence_order": sequence,
                }))
                .await;
            stage.assert_status(StatusCode::CREATED);
            stage_ids.push(stage.json::<Value>()["data"]["id"].clone());
        }

        // Record the later stage first; listing must still follow the
        // pipeline sequence.
        for stage_id in &stage_ids {
            let record = server
                .post("/api/stage-progress")
                .authorization_bearer(&token)
                .json(&json!({
                    "placement_progress_id": &progress_id,
                    "stage_id": stage_id,
                }))
                .await;
            record.assert_status(StatusCode::CREATED);
        }

        let listed = server
            .get("/api/stage-progress")
            .authorization_bearer(&token)
            .await;
        listed.assert_status(StatusCode::OK);
        let body: Value = listed.json();
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["stage_id"], stage_ids[1]);
        assert_eq!(rows[1]["stage_id"], stage_ids[0]);
    }

    #[tokio::test]
    async fn test_active_companies_filter() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let token = admin_token(&server).await;

        create_company_via_api(&server, &token, "Open Corp", "10.00", true).await;
        create_company_via_api(&server, &token, "Closed Corp", "10.00", false).await;

        let response = server
            .get("/api/companies/active_companies")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Open Corp");
    }
}
