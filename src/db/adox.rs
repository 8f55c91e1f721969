//! ADOX catalog automation over COM (Windows only).
//!
//! Each call enters its own single-threaded COM apartment, creates an
//! `ADOX.Catalog`, binds it to the file through the first OLE DB provider that
//! accepts the connection string, and releases everything when the
//! [`AdoxCatalog`] is dropped. Apartments are never shared between calls.

use crate::db::catalog::BoundCatalog;
use crate::db::strategy::{provider_connection_string, resolve_first};
use crate::error::{DbError, DbResult};
use crate::models::{CatalogEntry, CatalogIndex, TableSchema};
use std::marker::PhantomData;
use tracing::debug;
use windows::Win32::System::Com::{
    CLSCTX_ALL, CLSIDFromProgID, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    CoUninitialize, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT,
    DISPPARAMS, IDispatch,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;
use windows::core::{BSTR, GUID, HSTRING, PCWSTR, VARIANT};

const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// A COM apartment entered on the current thread, left on drop.
///
/// Not `Send`: initialization and teardown must happen on the same thread.
pub struct ComApartment {
    _thread_bound: PhantomData<*const ()>,
}

impl ComApartment {
    pub fn enter() -> DbResult<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|e| {
                DbError::connection(
                    format!("Failed to initialize COM: {}", e),
                    "Catalog calls must run on a thread without a conflicting COM apartment",
                )
            })?;
        Ok(Self {
            _thread_bound: PhantomData,
        })
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Thin late-bound wrapper over `IDispatch`.
struct Dispatch {
    inner: IDispatch,
    /// Label used in error messages
    label: String,
}

impl Dispatch {
    fn create(prog_id: &str) -> windows::core::Result<Self> {
        let prog_id_w = HSTRING::from(prog_id);
        let inner: IDispatch = unsafe {
            let clsid = CLSIDFromProgID(PCWSTR(prog_id_w.as_ptr()))?;
            CoCreateInstance(&clsid, None, CLSCTX_ALL)?
        };
        Ok(Self {
            inner,
            label: prog_id.to_string(),
        })
    }

    fn dispid(&self, name: &str) -> windows::core::Result<i32> {
        let name_w = HSTRING::from(name);
        let names = [PCWSTR(name_w.as_ptr())];
        let mut dispid = 0i32;
        unsafe {
            self.inner.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut dispid,
            )?;
        }
        Ok(dispid)
    }

    fn invoke(
        &self,
        name: &str,
        flags: DISPATCH_FLAGS,
        mut args: Vec<VARIANT>,
    ) -> windows::core::Result<VARIANT> {
        let dispid = self.dispid(name)?;
        // COM expects arguments in reverse order
        args.reverse();
        let mut named_put = DISPID_PROPERTYPUT;
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: if args.is_empty() {
                std::ptr::null_mut()
            } else {
                args.as_mut_ptr()
            },
            rgdispidNamedArgs: if is_put {
                &mut named_put
            } else {
                std::ptr::null_mut()
            },
            cArgs: args.len() as u32,
            cNamedArgs: u32::from(is_put),
        };
        let mut result = VARIANT::default();
        unsafe {
            self.inner.Invoke(
                dispid,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                Some(&mut result as *mut _),
                None,
                None,
            )?;
        }
        Ok(result)
    }

    fn lookup_error(&self, member: &str, err: windows::core::Error) -> DbError {
        DbError::schema(format!("{} lookup failed: {}", member, err.message()), &self.label)
    }

    fn get(&self, name: &str) -> DbResult<VARIANT> {
        self.invoke(name, DISPATCH_PROPERTYGET, Vec::new())
            .map_err(|e| self.lookup_error(name, e))
    }

    fn put(&self, name: &str, value: VARIANT) -> windows::core::Result<()> {
        self.invoke(name, DISPATCH_PROPERTYPUT, vec![value]).map(|_| ())
    }

    fn get_dispatch(&self, name: &str) -> DbResult<Dispatch> {
        let value = self.get(name)?;
        let inner = IDispatch::try_from(&value).map_err(|e| self.lookup_error(name, e))?;
        Ok(Dispatch {
            inner,
            label: format!("{}.{}", self.label, name),
        })
    }

    fn get_string(&self, name: &str) -> DbResult<String> {
        let value = self.get(name)?;
        BSTR::try_from(&value)
            .map(|s| s.to_string())
            .map_err(|e| self.lookup_error(name, e))
    }

    fn get_bool(&self, name: &str) -> DbResult<bool> {
        let value = self.get(name)?;
        bool::try_from(&value).map_err(|e| self.lookup_error(name, e))
    }

    fn count(&self) -> DbResult<i32> {
        let value = self.get("Count")?;
        i32::try_from(&value).map_err(|e| self.lookup_error("Count", e))
    }

    /// `Item(key)` of a collection, where `key` is an index or a name.
    fn item(&self, key: VARIANT, key_label: &str) -> DbResult<Dispatch> {
        let value = self
            .invoke("Item", DISPATCH_METHOD | DISPATCH_PROPERTYGET, vec![key])
            .map_err(|e| DbError::schema(e.message().to_string(), key_label))?;
        let inner = IDispatch::try_from(&value)
            .map_err(|e| DbError::schema(e.message().to_string(), key_label))?;
        Ok(Dispatch {
            inner,
            label: key_label.to_string(),
        })
    }

    /// Every member of a collection, in collection order.
    fn items(&self) -> DbResult<Vec<Dispatch>> {
        let count = self.count()?;
        (0..count)
            .map(|i| self.item(VARIANT::from(i), &format!("{}[{}]", self.label, i)))
            .collect()
    }

    /// The `Name` of every member of the `collection` property.
    fn names_of(&self, collection: &str) -> DbResult<Vec<String>> {
        self.get_dispatch(collection)?
            .items()?
            .iter()
            .map(|item| item.get_string("Name"))
            .collect()
    }
}

/// An `ADOX.Catalog` bound to one database file.
pub struct AdoxCatalog {
    // Declared before the apartment so it is released first.
    catalog: Dispatch,
    provider: String,
    _apartment: ComApartment,
}

impl AdoxCatalog {
    /// Enter an apartment, create the catalog and bind it with the first working provider.
    pub fn bind(path: &str, providers: &[String]) -> DbResult<Self> {
        let apartment = ComApartment::enter()?;
        let catalog = Dispatch::create("ADOX.Catalog").map_err(|e| {
            DbError::connection(
                format!("Failed to create ADOX object: {}", e),
                "Install the Microsoft Access Database Engine (ADOX is part of MDAC/ACE)",
            )
        })?;

        let resolved = resolve_first(path, providers, |provider| {
            let conn_str = provider_connection_string(provider, path);
            catalog
                .put("ActiveConnection", VARIANT::from(BSTR::from(conn_str.as_str())))
                .map_err(|e| DbError::connection(e.message().to_string(), ""))
        })?;
        debug!(db_path = %path, provider = %resolved.provider, "ADOX catalog bound");

        Ok(Self {
            catalog,
            provider: resolved.provider,
            _apartment: apartment,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl BoundCatalog for AdoxCatalog {
    fn entries(&mut self) -> DbResult<Vec<CatalogEntry>> {
        self.catalog
            .get_dispatch("Tables")?
            .items()?
            .iter()
            .map(|table| {
                let name = table.get_string("Name")?;
                let kind = table.get_string("Type")?;
                Ok(CatalogEntry::new(name, &kind))
            })
            .collect()
    }

    fn table_schema(&mut self, table_name: &str) -> DbResult<TableSchema> {
        let tables = self.catalog.get_dispatch("Tables")?;
        let table = tables.item(VARIANT::from(BSTR::from(table_name)), table_name)?;

        let fields = table.names_of("Columns")?;

        let indexes = table
            .get_dispatch("Indexes")?
            .items()?
            .iter()
            .map(|index| {
                let primary_key = index.get_bool("PrimaryKey")?;
                let columns = if primary_key {
                    index.names_of("Columns")?
                } else {
                    Vec::new()
                };
                Ok(CatalogIndex {
                    name: index.get_string("Name")?,
                    primary_key,
                    columns,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(TableSchema::from_catalog(fields, &indexes))
    }
}
