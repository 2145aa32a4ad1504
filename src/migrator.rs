use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240401_000001_create_reference_tables::Migration),
            Box::new(m20240401_000002_create_catalog_tables::Migration),
            Box::new(m20240401_000003_create_ads_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240401_000001_create_reference_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SubCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SubCategories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SubCategories::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(SubCategories::Name).string().not_null())
                        .col(
                            ColumnDef::new(SubCategories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Variants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Variants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Variants::SubCategoryId).uuid().not_null())
                        .col(ColumnDef::new(Variants::Name).string().not_null())
                        .col(
                            ColumnDef::new(Variants::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Counties::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Counties::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Counties::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SubCounties::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SubCounties::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SubCounties::CountyId).uuid().not_null())
                        .col(ColumnDef::new(SubCounties::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UnitsOfMeasurement::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnitsOfMeasurement::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitsOfMeasurement::Name)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitsOfMeasurement::Abbreviation)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Stores::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Stores::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Stores::Name).string().not_null())
                        .col(ColumnDef::new(Stores::PhoneNumber).string().null())
                        .col(ColumnDef::new(Stores::Email).string().null())
                        .col(ColumnDef::new(Stores::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Stores::OwnerUsername).string().not_null())
                        .col(ColumnDef::new(Stores::OwnerEmail).string().null())
                        .col(ColumnDef::new(Stores::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stores_owner_id")
                        .table(Stores::Table)
                        .col(Stores::OwnerId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stores::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UnitsOfMeasurement::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SubCounties::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Counties::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Variants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SubCategories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Slug,
    }

    #[derive(DeriveIden)]
    pub(super) enum SubCategories {
        Table,
        Id,
        CategoryId,
        Name,
        Slug,
    }

    #[derive(DeriveIden)]
    pub(super) enum Variants {
        Table,
        Id,
        SubCategoryId,
        Name,
        Slug,
    }

    #[derive(DeriveIden)]
    pub(super) enum Counties {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    pub(super) enum SubCounties {
        Table,
        Id,
        CountyId,
        Name,
    }

    #[derive(DeriveIden)]
    pub(super) enum UnitsOfMeasurement {
        Table,
        Id,
        Name,
        Abbreviation,
    }

    #[derive(DeriveIden)]
    pub(super) enum Stores {
        Table,
        Id,
        Name,
        PhoneNumber,
        Email,
        OwnerId,
        OwnerUsername,
        OwnerEmail,
        CreatedAt,
    }
}

mod m20240401_000002_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).text().not_null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Products::SubCategoryId).uuid().null())
                        .col(ColumnDef::new(Products::VariantId).uuid().null())
                        .col(ColumnDef::new(Products::CountyId).uuid().null())
                        .col(ColumnDef::new(Products::SubcountyId).uuid().null())
                        .col(ColumnDef::new(Products::Town).string().null())
                        .col(
                            ColumnDef::new(Products::UnitOfMeasurementId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(Products::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Products::Status).string().not_null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_status_created_at")
                        .table(Products::Table)
                        .col(Products::Status)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_store_id")
                        .table(Products::Table)
                        .col(Products::StoreId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductImages::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductImages::Url).string().not_null())
                        .col(
                            ColumnDef::new(ProductImages::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_images_product_id")
                        .table(ProductImages::Table)
                        .col(ProductImages::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductViews::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductViews::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductViews::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductViews::ViewedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_views_product_id")
                        .table(ProductViews::Table)
                        .col(ProductViews::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::ReviewerName).string().not_null())
                        .col(ColumnDef::new(Reviews::ReviewerEmail).string().null())
                        .col(ColumnDef::new(Reviews::Rating).small_integer().not_null())
                        .col(ColumnDef::new(Reviews::Body).text().not_null())
                        .col(ColumnDef::new(Reviews::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_product_id")
                        .table(Reviews::Table)
                        .col(Reviews::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductViews::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ProductImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Slug,
        Description,
        Price,
        CategoryId,
        SubCategoryId,
        VariantId,
        CountyId,
        SubcountyId,
        Town,
        UnitOfMeasurementId,
        StoreId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductImages {
        Table,
        Id,
        ProductId,
        Url,
        SortOrder,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductViews {
        Table,
        Id,
        ProductId,
        ViewedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Reviews {
        Table,
        Id,
        ProductId,
        ReviewerName,
        ReviewerEmail,
        Rating,
        Body,
        CreatedAt,
    }
}

mod m20240401_000003_create_ads_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240401_000003_create_ads_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Ads::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Ads::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Ads::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Ads::Status).string().not_null())
                        .col(ColumnDef::new(Ads::PaidStatus).string().not_null())
                        .col(ColumnDef::new(Ads::StartsOn).timestamp().not_null())
                        .col(ColumnDef::new(Ads::EndsOn).timestamp().not_null())
                        .col(ColumnDef::new(Ads::MonthlyCost).decimal().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ads_product_id")
                        .table(Ads::Table)
                        .col(Ads::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ads_status_paid_status")
                        .table(Ads::Table)
                        .col(Ads::Status)
                        .col(Ads::PaidStatus)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AdPayments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AdPayments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AdPayments::AdId).uuid().not_null())
                        .col(ColumnDef::new(AdPayments::Amount).decimal().not_null())
                        .col(ColumnDef::new(AdPayments::PaidAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ad_payments_ad_id")
                        .table(AdPayments::Table)
                        .col(AdPayments::AdId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AdPayments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Ads::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Ads {
        Table,
        Id,
        ProductId,
        Status,
        PaidStatus,
        StartsOn,
        EndsOn,
        MonthlyCost,
    }

    #[derive(DeriveIden)]
    pub(super) enum AdPayments {
        Table,
        Id,
        AdId,
        Amount,
        PaidAt,
    }
}
