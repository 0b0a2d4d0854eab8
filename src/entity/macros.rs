/// Declares an entity struct together with its [`Entity`](crate::entity::Entity)
/// and [`EntityType`](crate::entity::EntityType) implementations.
///
/// Every field maps to one column (`field: Type => "Column"`). The struct must
/// declare an `id: Uuid` field; it becomes the primary key.
///
/// ```
/// use budgetboard_persist::entity_struct;
/// use uuid::Uuid;
///
/// entity_struct! {
///     pub struct Payee table = "Payees" {
///         id: Uuid => "Id",
///         name: String => "Name",
///         memo: Option<String> => "Memo",
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident table = $table:literal {
            $( $(#[$field_meta:meta])* $field:ident : $field_ty:ty => $column:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $( $(#[$field_meta])* pub $field: $field_ty, )+
        }

        impl $name {
            /// Storage table backing this entity.
            pub const TABLE: &'static str = $table;

            fn __descriptor() -> &'static $crate::entity::EntityDescriptor {
                static DESCRIPTOR: $crate::entity::EntityDescriptor = $crate::entity::EntityDescriptor {
                    entity_name: stringify!($name),
                    table_name: $table,
                    properties: &[
                        $(
                            $crate::entity::PropertyDescriptor {
                                name: $column,
                                field: stringify!($field),
                                data_type: <$field_ty as $crate::entity::PersistField>::DATA_TYPE,
                                nullable: <$field_ty as $crate::entity::PersistField>::NULLABLE,
                            },
                        )+
                    ],
                };
                &DESCRIPTOR
            }
        }

        impl $crate::entity::Entity for $name {
            fn descriptor(&self) -> &'static $crate::entity::EntityDescriptor {
                Self::__descriptor()
            }

            fn key(&self) -> $crate::uuid::Uuid {
                self.id
            }

            fn property(&self, name: &str) -> Option<$crate::core::Value> {
                match name {
                    $( $column => Some($crate::entity::PersistField::to_value(&self.$field)), )+
                    _ => None,
                }
            }

            fn set_property(
                &mut self,
                name: &str,
                value: $crate::core::Value,
            ) -> $crate::core::Result<()> {
                match name {
                    $(
                        $column => {
                            self.$field = <$field_ty as $crate::entity::PersistField>::from_value(value)
                                .map_err(|err| $crate::core::DbError::TypeMismatch(format!(
                                    "{}.{}: {}",
                                    $table,
                                    $column,
                                    err
                                )))?;
                            Ok(())
                        }
                    )+
                    _ => Err($crate::core::DbError::ColumnNotFound(
                        name.to_string(),
                        $table.to_string(),
                    )),
                }
            }

            fn clone_entity(&self) -> Box<dyn $crate::entity::Entity> {
                Box::new(self.clone())
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        impl $crate::entity::EntityType for $name {
            fn entity_descriptor() -> &'static $crate::entity::EntityDescriptor {
                Self::__descriptor()
            }

            fn from_row(
                schema: &$crate::core::Schema,
                row: &$crate::core::Row,
            ) -> $crate::core::Result<Self> {
                Ok(Self {
                    $( $field: $crate::entity::column_value::<$field_ty>($table, schema, row, $column)?, )+
                })
            }
        }
    };
}
