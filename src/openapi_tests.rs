#[cfg(test)]
mod tests {
    use crate::cli::commands::openapi::render_openapi;
    use crate::cli::SpecFormat;
    use crate::schemas::ApiDoc;
    use utoipa::openapi::PathItemType;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        for schema in [
            "ErrorResponse",
            "HealthResponse",
            "UserResponse",
            "TagResponse",
            "IngredientResponse",
            "RecipeResponse",
            "RecipeDetailResponse",
        ] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("error"));
            assert!(properties.contains_key("code"));
            assert!(properties.contains_key("success"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_user_response_never_documents_password() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        if let Some(utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj))) =
            components.schemas.get("UserResponse")
        {
            assert!(obj.properties.contains_key("email"));
            assert!(obj.properties.contains_key("name"));
            assert!(!obj.properties.contains_key("password"));
        } else {
            panic!("UserResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_cover_routes() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let me = paths.get("/api/user/me").expect("missing /api/user/me");
        assert!(me.operations.contains_key(&PathItemType::Get));
        assert!(me.operations.contains_key(&PathItemType::Patch));
        assert!(me.operations.contains_key(&PathItemType::Put));
        assert!(!me.operations.contains_key(&PathItemType::Post));

        let detail = paths
            .get("/api/recipe/recipes/{recipe_id}")
            .expect("missing recipe detail path");
        for method in [
            PathItemType::Get,
            PathItemType::Put,
            PathItemType::Patch,
            PathItemType::Delete,
        ] {
            assert!(detail.operations.contains_key(&method));
        }

        for path in [
            "/health",
            "/api/user/create",
            "/api/user/token",
            "/api/recipe/tags",
            "/api/recipe/ingredients",
            "/api/recipe/recipes",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_protected_operations_declare_token_security() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("token"));

        let recipes = openapi.paths.paths.get("/api/recipe/recipes").unwrap();
        let list = recipes.operations.get(&PathItemType::Get).unwrap();
        assert!(list.security.is_some());
        assert!(list.responses.responses.contains_key("401"));

        let create_user = openapi.paths.paths.get("/api/user/create").unwrap();
        let post = create_user.operations.get(&PathItemType::Post).unwrap();
        assert!(post.security.is_none());
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("ErrorResponse"));
    }

    #[test]
    fn test_render_openapi_formats() {
        let json = render_openapi(SpecFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["info"]["title"], "Recipe API");

        let yaml = render_openapi(SpecFormat::Yaml).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["info"]["title"].as_str(), Some("Recipe API"));
    }
}
