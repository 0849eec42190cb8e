//! `#[derive(Injectable)]` 实现
//!
//! 字段按属性生成注入代码:
//! - `#[inject]` / `#[inject("slot")]`: `Arc<T>` 字段从依赖槽注入，`Arc<dyn Trait>` 按能力注入
//! - `#[property("path")]` / `#[property("path", default)]`: 从属性环境读取
//! - 其余字段使用 `Default::default()`

use crate::component::ComponentArgs;
use crate::utils::{arc_inner_type, find_attribute, is_trait_object};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr, Meta, Result, Token, Type};

/// `#[property(...)]` 参数
struct PropertyArgs {
    path: LitStr,
    default: bool,
}

impl Parse for PropertyArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let path: LitStr = input.parse()?;
        let mut default = false;
        if input.parse::<Option<Token![,]>>()?.is_some() && !input.is_empty() {
            let flag: Ident = input.parse()?;
            if flag != "default" {
                return Err(syn::Error::new(flag.span(), "属性参数仅支持 default"));
            }
            default = true;
        }
        Ok(Self { path, default })
    }
}

/// 单个字段的注入方式
enum FieldSource {
    Dependency {
        slot: String,
        target: Type,
        capability: bool,
    },
    Property(PropertyArgs),
    Default,
}

impl FieldSource {
    fn from_field(field: &Field, name: &Ident) -> Result<Self> {
        let inject = find_attribute(field, "inject");
        let property = find_attribute(field, "property");

        match (inject, property) {
            (Some(_), Some(property)) => Err(syn::Error::new(
                property.span(),
                "字段不能同时使用 #[inject] 与 #[property]",
            )),
            (Some(inject), None) => {
                let slot = match &inject.meta {
                    Meta::Path(_) => name.to_string(),
                    _ => inject.parse_args::<LitStr>()?.value(),
                };
                let inner = arc_inner_type(&field.ty).ok_or_else(|| {
                    syn::Error::new(field.ty.span(), "#[inject] 字段的类型必须是 Arc<T>")
                })?;
                Ok(Self::Dependency {
                    slot,
                    target: inner.clone(),
                    capability: is_trait_object(inner),
                })
            }
            (None, Some(property)) => Ok(Self::Property(property.parse_args()?)),
            (None, None) => Ok(Self::Default),
        }
    }

    fn initializer(&self, field: &Field) -> TokenStream2 {
        let ty = &field.ty;
        match self {
            Self::Dependency {
                slot,
                target,
                capability: true,
            } => quote! { ctx.capability::<#target>(#slot)? },
            Self::Dependency { slot, target, .. } => quote! { ctx.get::<#target>(#slot)? },
            Self::Property(PropertyArgs {
                path,
                default: false,
            }) => quote! { ctx.property::<#ty>(#path)? },
            Self::Property(PropertyArgs {
                path,
                default: true,
            }) => quote! {
                ctx.optional_property::<#ty>(#path)?.unwrap_or_default()
            },
            Self::Default => quote! { ::core::default::Default::default() },
        }
    }
}

/// 实现 #[derive(Injectable)] 宏
pub fn derive_injectable_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let args = ComponentArgs::from_attributes(&input.attrs)?;
    let struct_name = &input.ident;
    let key = args.key_or(&struct_name.to_string());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.span(),
            "#[derive(Injectable)] 只能用于结构体",
        ));
    };

    let mut slots = Vec::new();
    let construction = match &data.fields {
        Fields::Named(fields) => {
            let mut initializers = Vec::new();
            for field in &fields.named {
                let Some(name) = field.ident.as_ref() else {
                    continue;
                };
                let source = FieldSource::from_field(field, name)?;
                if let FieldSource::Dependency { slot, .. } = &source {
                    if !slots.contains(slot) {
                        slots.push(slot.clone());
                    }
                }
                let value = source.initializer(field);
                initializers.push(quote! { #name: #value });
            }
            quote! { Self { #(#initializers),* } }
        }
        Fields::Unit => quote! { Self },
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new(
                fields.span(),
                "#[derive(Injectable)] 不支持元组结构体，请使用具名字段",
            ));
        }
    };

    let lifecycle = if args.per_request {
        quote! { ::infrastructure_common::Lifecycle::PerRequest }
    } else {
        quote! { ::infrastructure_common::Lifecycle::Singleton }
    };
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::di_abstractions::Injectable for #struct_name #ty_generics #where_clause {
            fn component_key() -> &'static str {
                #key
            }

            fn lifecycle() -> ::infrastructure_common::Lifecycle {
                #lifecycle
            }

            fn dependencies() -> ::std::vec::Vec<&'static str> {
                ::std::vec![#(#slots),*]
            }

            #[allow(unused_variables)]
            fn inject(
                ctx: &::di_abstractions::InjectionContext<'_>,
            ) -> ::core::result::Result<Self, ::infrastructure_common::ComponentFailure> {
                ::core::result::Result::Ok(#construction)
            }
        }
    })
}
