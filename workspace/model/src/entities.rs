//! This file serves as the root for all SeaORM entity modules.
//! Every domain row (tag, ingredient, recipe) carries a `user_id`; the API
//! layer filters on it, the storage layer does not.

pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod tag;
pub mod token;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::ingredient::Entity as Ingredient;
    pub use super::recipe::Entity as Recipe;
    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::tag::Entity as Tag;
    pub use super::token::Entity as Token;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    };

    use super::*;
    use crate::identity;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn sample_user(db: &DatabaseConnection, email: &str) -> user::Model {
        identity::create_user(db, email, "testpass", None)
            .await
            .expect("Failed to create user")
    }

    async fn sample_recipe(
        db: &DatabaseConnection,
        owner: &user::Model,
        title: &str,
    ) -> Result<recipe::Model, DbErr> {
        recipe::ActiveModel {
            user_id: Set(owner.id),
            title: Set(title.to_string()),
            time_minutes: Set(5),
            price: Set(Decimal::new(1000, 2)),
            link: Set(String::new()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_tag_str() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let tag = tag::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Vegan".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert_eq!(tag.to_string(), tag.name);
        Ok(())
    }

    #[tokio::test]
    async fn test_ingredient_str() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let ingredient = ingredient::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Cucumber".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert_eq!(ingredient.to_string(), ingredient.name);
        Ok(())
    }

    #[tokio::test]
    async fn test_recipe_str() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let recipe = sample_recipe(&db, &owner, "Steak and mushroom sauce").await?;

        assert_eq!(recipe.to_string(), recipe.title);
        assert_eq!(recipe.price, Decimal::new(1000, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_recipe_relations() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let vegan = tag::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Vegan".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let dessert = tag::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Dessert".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        let cocoa = ingredient::ActiveModel {
            user_id: Set(owner.id),
            name: Set("Cocoa".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let recipe = sample_recipe(&db, &owner, "Tiramisu").await?;
        recipe::replace_tags(&db, recipe.id, &[vegan.id, dessert.id]).await?;
        recipe::replace_ingredients(&db, recipe.id, &[cocoa.id]).await?;

        let tags = recipe.tags(&db).await?;
        assert_eq!(tags, vec![vegan.clone(), dessert.clone()]);
        assert_eq!(recipe.ingredients(&db).await?, vec![cocoa.clone()]);

        // Replacing drops links that are no longer listed
        recipe::replace_tags(&db, recipe.id, &[dessert.id]).await?;
        assert_eq!(recipe.tags(&db).await?, vec![dessert.clone()]);
        assert_eq!(RecipeTag::find().all(&db).await?.len(), 1);

        // The reverse side of the many-to-many relation
        let tagged = dessert.find_related(Recipe).all(&db).await?;
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, recipe.id);

        // Deleting the recipe cascades to the join rows
        recipe.delete(&db).await?;
        assert!(RecipeTag::find().all(&db).await?.is_empty());
        assert!(RecipeIngredient::find().all(&db).await?.is_empty());
        assert_eq!(Tag::find().all(&db).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_owner_filtering() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let watson = sample_user(&db, "watson@mail.fr").await;
        let holmes = sample_user(&db, "email2@mail.com").await;

        sample_recipe(&db, &watson, "Tiramisu").await?;
        sample_recipe(&db, &holmes, "Porridge").await?;
        sample_recipe(&db, &watson, "Pancakes").await?;

        let own = Recipe::find()
            .filter(recipe::Column::UserId.eq(watson.id))
            .order_by_desc(recipe::Column::Id)
            .all(&db)
            .await?;

        let titles: Vec<_> = own.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Pancakes", "Tiramisu"]);

        let all_for_holmes = holmes.find_related(Recipe).all(&db).await?;
        assert_eq!(all_for_holmes.len(), 1);
        assert_eq!(all_for_holmes[0].title, "Porridge");
        Ok(())
    }

    #[tokio::test]
    async fn test_token_get_or_create_is_stable() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let first = token::get_or_create(&db, &owner).await?;
        let second = token::get_or_create(&db, &owner).await?;
        assert_eq!(first.key, second.key);
        assert_eq!(Token::find().all(&db).await?.len(), 1);

        let resolved = token::find_user(&db, &first.key).await?;
        assert_eq!(resolved.map(|u| u.id), Some(owner.id));
        assert!(token::find_user(&db, "missing").await?.is_none());

        // Deleting the user removes its token
        User::delete_by_id(owner.id).exec(&db).await?;
        assert!(Token::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_token_concurrent_first_logins_share_key() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let owner = sample_user(&db, "test@mail.fr").await;

        let (a, b) = tokio::join!(
            token::get_or_create(&db, &owner),
            token::get_or_create(&db, &owner)
        );
        let (a, b) = (a?, b?);

        assert_eq!(a.key, b.key);
        assert_eq!(Token::find().all(&db).await?.len(), 1);
        Ok(())
    }
}
