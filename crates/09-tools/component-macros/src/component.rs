//! 组件属性解析与 `#[derive(Component)]` 实现

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, LitStr, Result};

/// 组件配置参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentArgs {
    /// 自定义组件键
    pub key: Option<String>,
    /// 是否按需构造
    pub per_request: bool,
}

impl ComponentArgs {
    /// 从 `#[component(...)]` 属性解析参数
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    let value: LitStr = meta.value()?.parse()?;
                    if value.value().is_empty() {
                        return Err(syn::Error::new(value.span(), "组件键不能为空"));
                    }
                    args.key = Some(value.value());
                } else if meta.path.is_ident("per_request") {
                    args.per_request = true;
                } else if meta.path.is_ident("singleton") {
                    args.per_request = false;
                } else {
                    return Err(meta.error("未知的组件参数，可用: key, per_request, singleton"));
                }
                Ok(())
            })?;
        }

        Ok(args)
    }

    /// 组件键，缺省为结构体名
    pub fn key_or(&self, default: &str) -> String {
        self.key.clone().unwrap_or_else(|| default.to_string())
    }
}

/// 实现 #[derive(Component)] 宏
pub fn derive_component_impl(input: DeriveInput) -> TokenStream {
    let args = match ComponentArgs::from_attributes(&input.attrs) {
        Ok(args) => args,
        Err(e) => return e.to_compile_error().into(),
    };

    let struct_name = &input.ident;
    let component_name = args.key_or(&struct_name.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::infrastructure_common::Component for #struct_name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                #component_name
            }
        }
    };

    TokenStream::from(expanded)
}
