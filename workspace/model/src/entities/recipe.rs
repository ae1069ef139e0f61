use std::fmt;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryOrder, Set};

use super::{ingredient, recipe_ingredient, recipe_tag, tag};

/// A recipe owned by a single user. Tags and ingredients are attached through
/// the `recipes_tags` and `recipes_ingredients` join tables.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The user who owns this recipe.
    pub user_id: i32,
    pub title: String,
    /// Preparation time in minutes.
    pub time_minutes: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub price: Decimal,
    /// External link to the original recipe, empty when not set.
    #[sea_orm(default_value = "")]
    pub link: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Relation for the many-to-many relationship with Tags.
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTag,
    /// Relation for the many-to-many relationship with Ingredients.
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<tag::Entity> for Entity {
    fn to() -> RelationDef {
        recipe_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(recipe_tag::Relation::Recipe.def().rev())
    }
}

impl Related<ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        recipe_ingredient::Relation::Ingredient.def()
    }
    fn via() -> Option<RelationDef> {
        Some(recipe_ingredient::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Tags attached to this recipe, ordered by id.
    pub async fn tags<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<tag::Model>, DbErr> {
        self.find_related(tag::Entity)
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await
    }

    /// Ingredients attached to this recipe, ordered by id.
    pub async fn ingredients<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Vec<ingredient::Model>, DbErr> {
        self.find_related(ingredient::Entity)
            .order_by_asc(ingredient::Column::Id)
            .all(db)
            .await
    }
}

/// Replaces the tag links of a recipe with `tag_ids`.
pub async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let links = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    recipe_tag::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Replaces the ingredient links of a recipe with `ingredient_ids`.
pub async fn replace_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if ingredient_ids.is_empty() {
        return Ok(());
    }

    let links = ingredient_ids
        .iter()
        .map(|ingredient_id| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(*ingredient_id),
        });
    recipe_ingredient::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
