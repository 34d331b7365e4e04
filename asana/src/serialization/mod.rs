//! Mapeamento entre tipos da aplicação e tasks do Asana
//!
//! Cada tipo serializável expõe uma tabela estática de propriedades
//! ([`FieldBindings`]): nome do custom field, se é opcional e como ler/escrever
//! o valor no tipo. A tabela é montada uma única vez (`Lazy`).
//!
//! ```ignore
//! #[derive(Debug, Default)]
//! struct Person {
//!     gid: String,
//!     name: String,
//!     dessert: String,
//!     languages: Vec<String>,
//! }
//!
//! asana::task_serializable! {
//!     Person {
//!         gid: gid,
//!         name: name,
//!         fields: {
//!             "Favorite dessert" => dessert,
//!         },
//!         optional: {
//!             "Languages spoken" => languages,
//!         },
//!     }
//! }
//! ```

pub mod serializer;

use crate::codec::FieldData;

pub use serializer::TaskSerializer;

#[doc(hidden)]
pub use once_cell::sync::Lazy;

/// Tipo de propriedade que sabe ir e voltar de [`FieldData`]
pub trait FieldProperty: Sized {
    fn to_field_data(&self) -> FieldData;
    fn from_field_data(data: FieldData) -> Self;
}

impl FieldProperty for String {
    fn to_field_data(&self) -> FieldData {
        FieldData::Scalar(self.clone())
    }

    fn from_field_data(data: FieldData) -> Self {
        data.stringify()
    }
}

/// `None` ↔ nulo; string vazia volta como `None`
impl FieldProperty for Option<String> {
    fn to_field_data(&self) -> FieldData {
        match self {
            Some(value) => FieldData::Scalar(value.clone()),
            None => FieldData::Null,
        }
    }

    fn from_field_data(data: FieldData) -> Self {
        Some(data.stringify()).filter(|value| !value.is_empty())
    }
}

impl FieldProperty for Vec<String> {
    fn to_field_data(&self) -> FieldData {
        FieldData::List(self.clone())
    }

    fn from_field_data(data: FieldData) -> Self {
        match data {
            FieldData::List(values) => values,
            FieldData::Scalar(value) if !value.is_empty() => vec![value],
            FieldData::Scalar(_) | FieldData::Null => Vec::new(),
        }
    }
}

/// Inteiros: valor não numérico volta como 0
impl FieldProperty for i64 {
    fn to_field_data(&self) -> FieldData {
        FieldData::Scalar(self.to_string())
    }

    fn from_field_data(data: FieldData) -> Self {
        let text = data.stringify();
        text.parse::<i64>()
            .or_else(|_| text.parse::<f64>().map(|value| value as i64))
            .unwrap_or_default()
    }
}

impl FieldProperty for f64 {
    fn to_field_data(&self) -> FieldData {
        FieldData::Scalar(self.to_string())
    }

    fn from_field_data(data: FieldData) -> Self {
        data.stringify().parse().unwrap_or_default()
    }
}

type Getter<T> = Box<dyn Fn(&T) -> FieldData + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, FieldData) + Send + Sync>;

/// Uma propriedade ligada a um custom field pelo nome
pub struct FieldBinding<T> {
    name: String,
    optional: bool,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldBinding<T> {
    /// Nome exato do custom field
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn read(&self, source: &T) -> FieldData {
        (self.get)(source)
    }

    pub fn write(&self, target: &mut T, data: FieldData) {
        (self.set)(target, data)
    }
}

/// Tabela de propriedades de um tipo serializável
pub struct FieldBindings<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> FieldBindings<T> {
    pub fn builder() -> FieldBindingsBuilder<T> {
        FieldBindingsBuilder {
            bindings: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldBinding<T>> {
        self.bindings.iter()
    }

    /// Propriedade ligada ao custom field `name`
    pub fn get(&self, name: &str) -> Option<&FieldBinding<T>> {
        self.bindings.iter().find(|binding| binding.name == name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

pub struct FieldBindingsBuilder<T> {
    bindings: Vec<FieldBinding<T>>,
}

impl<T: 'static> FieldBindingsBuilder<T> {
    /// Propriedade cujo campo precisa existir no catálogo
    pub fn required<P: FieldProperty + 'static>(
        self,
        name: &str,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.bind(name, false, get, get_mut)
    }

    /// Propriedade ignorada quando o campo não existe no catálogo
    pub fn optional<P: FieldProperty + 'static>(
        self,
        name: &str,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.bind(name, true, get, get_mut)
    }

    fn bind<P: FieldProperty + 'static>(
        mut self,
        name: &str,
        optional: bool,
        get: fn(&T) -> &P,
        get_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.bindings.push(FieldBinding {
            name: name.to_string(),
            optional,
            get: Box::new(move |source| get(source).to_field_data()),
            set: Box::new(move |target, data| *get_mut(target) = P::from_field_data(data)),
        });
        self
    }

    pub fn build(self) -> FieldBindings<T> {
        FieldBindings {
            bindings: self.bindings,
        }
    }
}

/// Tipo da aplicação que vira uma task com custom fields
pub trait TaskSerializable: Default + Send + Sync + Sized + 'static {
    fn gid(&self) -> &str;
    fn set_gid(&mut self, gid: String);
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);

    /// Tabela estática de propriedades
    fn bindings() -> &'static FieldBindings<Self>;
}

/// Implementa [`TaskSerializable`] a partir dos nomes dos campos da struct
#[macro_export]
macro_rules! task_serializable {
    (
        $ty:ty {
            gid: $gid:ident,
            name: $name:ident,
            fields: { $($field_name:literal => $field:ident),* $(,)? }
            $(, optional: { $($optional_name:literal => $optional:ident),* $(,)? })?
            $(,)?
        }
    ) => {
        impl $crate::serialization::TaskSerializable for $ty {
            fn gid(&self) -> &str {
                &self.$gid
            }

            fn set_gid(&mut self, gid: String) {
                self.$gid = gid;
            }

            fn name(&self) -> &str {
                &self.$name
            }

            fn set_name(&mut self, name: String) {
                self.$name = name;
            }

            fn bindings() -> &'static $crate::serialization::FieldBindings<Self> {
                static BINDINGS: $crate::serialization::Lazy<$crate::serialization::FieldBindings<$ty>> =
                    $crate::serialization::Lazy::new(|| {
                        $crate::serialization::FieldBindings::builder()
                            $(.required($field_name, |source: &$ty| &source.$field, |target: &mut $ty| &mut target.$field))*
                            $($(.optional($optional_name, |source: &$ty| &source.$optional, |target: &mut $ty| &mut target.$optional))*)?
                            .build()
                    });
                &BINDINGS
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Order {
        gid: String,
        name: String,
        quantity: i64,
        note: Option<String>,
        tags: Vec<String>,
    }

    crate::task_serializable! {
        Order {
            gid: gid,
            name: name,
            fields: {
                "Quantity" => quantity,
            },
            optional: {
                "Note" => note,
                "Tags" => tags,
            },
        }
    }

    #[test]
    fn test_macro_builds_binding_table() {
        let bindings = Order::bindings();
        assert_eq!(bindings.len(), 3);
        assert!(!bindings.get("Quantity").unwrap().is_optional());
        assert!(bindings.get("Note").unwrap().is_optional());
        assert!(bindings.get("quantity").is_none());
        assert!(std::ptr::eq(bindings, Order::bindings()));
    }

    #[test]
    fn test_bindings_read_and_write() {
        let bindings = Order::bindings();
        let mut order = Order::default();

        bindings.get("Quantity").unwrap().write(&mut order, "12".into());
        bindings.get("Tags").unwrap().write(&mut order, FieldData::List(vec!["a".into()]));
        bindings.get("Note").unwrap().write(&mut order, "".into());

        assert_eq!(order.quantity, 12);
        assert_eq!(order.tags, vec!["a"]);
        assert_eq!(order.note, None);
        assert_eq!(bindings.get("Note").unwrap().read(&order), FieldData::Null);
    }

    #[test]
    fn test_number_properties_tolerate_api_formats() {
        assert_eq!(i64::from_field_data("7.0".into()), 7);
        assert_eq!(i64::from_field_data("".into()), 0);
        assert_eq!(f64::from_field_data("2.5".into()), 2.5);
        assert_eq!(2.0f64.to_field_data(), FieldData::Scalar("2".into()));
    }
}
