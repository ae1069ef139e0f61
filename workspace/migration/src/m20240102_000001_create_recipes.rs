use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create recipes table
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(pk_auto(Recipes::Id))
                    .col(integer(Recipes::UserId))
                    .col(string(Recipes::Title))
                    .col(integer(Recipes::TimeMinutes))
                    .col(decimal(Recipes::Price).decimal_len(5, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipe_user")
                            .from(Recipes::Table, Recipes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes_tags table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesTags::Table)
                    .if_not_exists()
                    .col(integer(RecipesTags::RecipeId))
                    .col(integer(RecipesTags::TagId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_tags")
                            .col(RecipesTags::RecipeId)
                            .col(RecipesTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_recipe")
                            .from(RecipesTags::Table, RecipesTags::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_tag")
                            .from(RecipesTags::Table, RecipesTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes_ingredients table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesIngredients::Table)
                    .if_not_exists()
                    .col(integer(RecipesIngredients::RecipeId))
                    .col(integer(RecipesIngredients::IngredientId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_ingredients")
                            .col(RecipesIngredients::RecipeId)
                            .col(RecipesIngredients::IngredientId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_recipe")
                            .from(RecipesIngredients::Table, RecipesIngredients::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_ingredient")
                            .from(RecipesIngredients::Table, RecipesIngredients::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner lookups back every list endpoint
        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_user_id")
                    .table(Recipes::Table)
                    .col(Recipes::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecipesIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipesTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    UserId,
    Title,
    TimeMinutes,
    Price,
}

#[derive(DeriveIden)]
enum RecipesTags {
    Table,
    RecipeId,
    TagId,
}

#[derive(DeriveIden)]
enum RecipesIngredients {
    Table,
    RecipeId,
    IngredientId,
}
