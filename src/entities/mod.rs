/// Catalog entities
pub mod ad;
pub mod ad_payment;
pub mod category;
pub mod county;
pub mod product;
pub mod product_image;
pub mod product_view;
pub mod review;
pub mod store;
pub mod sub_category;
pub mod sub_county;
pub mod unit_of_measurement;
pub mod variant;

// Re-export entities
pub use ad::{AdPaidStatus, AdStatus, Entity as Ad, Model as AdModel};
pub use ad_payment::{Entity as AdPayment, Model as AdPaymentModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use county::{Entity as County, Model as CountyModel};
pub use product::{Entity as Product, Model as ProductModel, ProductStatus};
pub use product_image::{Entity as ProductImage, Model as ProductImageModel};
pub use product_view::{Entity as ProductView, Model as ProductViewModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use store::{Entity as Store, Model as StoreModel};
pub use sub_category::{Entity as SubCategory, Model as SubCategoryModel};
pub use sub_county::{Entity as SubCounty, Model as SubCountyModel};
pub use unit_of_measurement::{Entity as UnitOfMeasurement, Model as UnitOfMeasurementModel};
pub use variant::{Entity as Variant, Model as VariantModel};
