//! Schema generation with an embedded round-trip check.
//!
//! Before an example is published it must survive `decode(encode(example))`
//! through the codec, come back as the same variant, re-encode to the same
//! members in the same order, and contain every required property. A failure
//! is a defect in the registered type, so generation stops with
//! [`SchemaError::SelfCheck`] instead of emitting a document with bad examples.
use crate::codec::Codec;
use crate::error::SchemaError;
use crate::registry::{Factory, Polymorphic, Registry, TypeDescriptor};
use crate::schema::{JsonType, PropertySchema, SchemaBuilder, SchemaDocument};
use crate::value::JsonValue;

pub struct SchemaGenerator<'f> {
    codec: Codec<'f>,
}

impl<'f> SchemaGenerator<'f> {
    pub fn new(factory: &'f Factory) -> Self {
        Self { codec: Codec::new(factory) }
    }

    /// Document for one registered variant of interface `T`.
    pub fn variant<T: ?Sized + Polymorphic>(
        &self,
        discriminator: &str,
    ) -> Result<SchemaDocument, SchemaError> {
        let registry = self.codec.factory().registry_of::<T>()?;
        let descriptor = registry.get(discriminator).ok_or_else(|| SchemaError::UnknownVariant {
            interface: registry.interface().to_owned(),
            discriminator: discriminator.to_owned(),
        })?;
        self.descriptor_document(registry, descriptor, false)
    }

    /// Document for interface `T` as a whole.
    pub fn interface<T: ?Sized + Polymorphic>(&self) -> Result<SchemaDocument, SchemaError> {
        let registry = self.codec.factory().registry_of::<T>()?;
        self.registry_document(registry, &|_| true)
    }

    /// One interface document per installed registry, in installation order.
    pub fn generate_all(&self) -> Result<Vec<SchemaDocument>, SchemaError> {
        self.generate_matching(|_| true)
    }

    /// Like [`generate_all`](Self::generate_all), restricted to the variants
    /// whose discriminator `keep` accepts. The union is built from those only.
    pub fn generate_matching<F>(&self, keep: F) -> Result<Vec<SchemaDocument>, SchemaError>
    where
        F: Fn(&str) -> bool,
    {
        self.codec
            .factory()
            .erased()
            .map(|r| r.document(self, &keep))
            .collect()
    }

    pub(crate) fn registry_document<T: ?Sized + Polymorphic>(
        &self,
        registry: &Registry<T>,
        keep: &dyn Fn(&str) -> bool,
    ) -> Result<SchemaDocument, SchemaError> {
        let kept: Vec<&TypeDescriptor<T>> = registry
            .descriptors()
            .filter(|d| keep(d.discriminator()))
            .collect();
        let mut variants = Vec::new();
        for descriptor in &kept {
            variants.push(self.descriptor_document(registry, descriptor, false)?);
        }
        let default = registry.default_descriptor().filter(|d| keep(d.discriminator()));
        if let Some(descriptor) = default {
            variants.push(self.descriptor_document(registry, descriptor, true)?);
        }

        let field = registry.discriminator_field();
        let mut properties: Vec<PropertySchema> = Vec::new();
        for doc in &variants {
            for prop in &doc.properties {
                if properties.iter().all(|p| p.name != prop.name) {
                    let mut prop = prop.clone();
                    prop.required = variants.iter().all(|v| v.required.contains(&prop.name));
                    properties.push(prop);
                }
            }
        }
        if let Some(prop) = properties.iter_mut().find(|p| p.name == field) {
            prop.const_value = None;
            prop.enum_values = kept.iter().map(|d| JsonValue::from(d.discriminator())).collect();
            prop.description =
                format!("Discriminator selecting one of the {} variants", registry.interface());
        }

        let required = properties.iter().filter(|p| p.required).map(|p| p.name.clone()).collect();
        let references = collect_references(&properties);
        let examples = variants.iter().flat_map(|v| v.examples.iter().cloned()).collect();
        tracing::info!(
            interface = %registry.interface(),
            variants = variants.len(),
            "interface schema generated"
        );
        Ok(SchemaDocument {
            title: registry.interface().to_owned(),
            properties,
            required,
            references,
            examples,
            variants,
        })
    }

    fn descriptor_document<T: ?Sized + Polymorphic>(
        &self,
        registry: &Registry<T>,
        descriptor: &TypeDescriptor<T>,
        is_default: bool,
    ) -> Result<SchemaDocument, SchemaError> {
        let title = descriptor.discriminator().to_owned();
        let field = registry.discriminator_field();

        let mut builder = SchemaBuilder::new();
        descriptor.describe(&mut builder);
        if !builder.has(field) {
            builder.property(field, JsonType::String, "Discriminator");
        }
        for prop in builder.properties_mut().iter_mut().filter(|p| p.name == field) {
            prop.required = true;
            prop.const_value = if is_default {
                None
            } else {
                Some(JsonValue::from(descriptor.discriminator()))
            };
            if is_default {
                prop.description = "Any discriminator not registered elsewhere".to_owned();
            }
        }
        let required = builder.required_names();
        let properties = builder.into_properties(descriptor.layout());

        let examples = descriptor.examples();
        if examples.is_empty() {
            let reason = "no examples registered".to_owned();
            tracing::error!(variant = %title, %reason, "schema example failed its self-check");
            return Err(SchemaError::SelfCheck { title, index: 0, reason });
        }
        let examples = examples
            .iter()
            .enumerate()
            .map(|(index, example)| self.self_check(registry, &title, &required, index, &**example))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            interface = %registry.interface(),
            variant = %title,
            examples = examples.len(),
            "variant schema generated"
        );
        Ok(SchemaDocument {
            title,
            references: collect_references(&properties),
            properties,
            required,
            examples,
            variants: Vec::new(),
        })
    }

    fn self_check<T: ?Sized + Polymorphic>(
        &self,
        registry: &Registry<T>,
        title: &str,
        required: &[String],
        index: usize,
        example: &T,
    ) -> Result<JsonValue, SchemaError> {
        let fail = |reason: String| {
            tracing::error!(
                variant = %title,
                index,
                %reason,
                "schema example failed its self-check"
            );
            SchemaError::SelfCheck { title: title.to_owned(), index, reason }
        };
        let factory = self.codec.factory();

        let encoded = registry.encode(example, factory).map_err(|e| fail(format!("encode: {e}")))?;
        if let Some(name) = required.iter().find(|name| encoded.get(name).is_none()) {
            return Err(fail(format!("required property `{name}` is missing")));
        }
        let bytes = self.codec.encode(&encoded).map_err(|e| fail(format!("encode: {e}")))?;
        let decoded = self
            .codec
            .decode_polymorphic::<T>(&bytes)
            .map_err(|e| fail(format!("decode: {e}")))?;
        if decoded.discriminator() != example.discriminator() {
            return Err(fail(format!(
                "decoded as `{}` instead of `{}`",
                decoded.discriminator(),
                example.discriminator()
            )));
        }
        let reencoded = registry
            .encode(&*decoded, factory)
            .map_err(|e| fail(format!("re-encode: {e}")))?;
        if reencoded != encoded {
            return Err(fail(format!("round trip changed the value: {encoded} became {reencoded}")));
        }
        if !reencoded.same_layout(&encoded) {
            return Err(fail(format!(
                "round trip changed member order: {encoded} became {reencoded}"
            )));
        }
        Ok(encoded)
    }
}

fn collect_references(properties: &[PropertySchema]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in properties.iter().filter_map(|p| p.json_type.reference()) {
        if !out.iter().any(|r| r == name) {
            out.push(name.to_owned());
        }
    }
    out
}
