/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runs an async test body on a fresh multi-threaded runtime with a time limit.
///
/// Accepts `timeout_secs = N` (default 30). Panics raised anywhere during the
/// test, including in spawned tasks, are reported with their location.
#[proc_macro_attribute]
pub fn symposium_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut timeout_secs = DEFAULT_TIMEOUT_SECS;
    let attr_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("timeout_secs") {
            let value: LitInt = meta.value()?.parse()?;
            timeout_secs = value.base10_parse()?;
            Ok(())
        } else {
            Err(meta.error("unsupported symposium_test property; expected `timeout_secs`"))
        }
    });
    parse_macro_input!(attr with attr_parser);

    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;
    let attrs = &input.attrs;
    let name = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;

    let async_name = syn::Ident::new(&format!("__{name}_async"), name.span());

    let expanded = quote! {
        #[test]
        #(#attrs)*
        #vis fn #name() #output {
            use std::sync::atomic::{AtomicBool, Ordering};
            use std::sync::Arc;
            use ::symposium_test::__private::{parking_lot, tokio, tracing};

            #[derive(Clone, Default)]
            struct PanicInfo {
                occurred: Arc<AtomicBool>,
                message: Arc<parking_lot::Mutex<Option<String>>>,
                location: Arc<parking_lot::Mutex<Option<String>>>,
            }

            let panic_info = PanicInfo::default();
            let panic_info_hook = panic_info.clone();

            let orig_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                panic_info_hook.occurred.store(true, Ordering::SeqCst);
                let message = info
                    .payload()
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| info.payload().downcast_ref::<String>().cloned());
                *panic_info_hook.message.lock() = message.clone();
                *panic_info_hook.location.lock() = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                tracing::error!(
                    "Panic: {}",
                    message.unwrap_or_else(|| "No error message".to_string()).trim().replace('\n', " ")
                );
                orig_hook(info);
            }));

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build the test runtime");

            let limit = std::time::Duration::from_secs(#timeout_secs);
            let result = runtime.block_on(async {
                let test_span = tracing::info_span!("symposium_test", name = stringify!(#name));
                let _enter = test_span.enter();
                tokio::time::timeout(limit, #async_name()).await
            });
            runtime.shutdown_timeout(std::time::Duration::from_secs(1));

            if panic_info.occurred.load(Ordering::SeqCst) {
                let location = panic_info
                    .location
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "unknown location".to_string());
                let message = panic_info
                    .message
                    .lock()
                    .clone()
                    .unwrap_or_else(|| "No error message".to_string());
                panic!("Panic at {}: {}", location, message.trim().replace('\n', " "));
            }

            match result {
                Ok(outcome) => outcome,
                Err(_) => panic!(
                    "test `{}` did not finish within {} s",
                    stringify!(#name),
                    #timeout_secs
                ),
            }
        }

        async fn #async_name(#inputs) #output #body
    };

    expanded.into()
}
