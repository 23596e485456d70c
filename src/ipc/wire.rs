/*!

The documents exchanged with the simulator.

A request is a JSON object. Its canonical form uses typed values

```json
{"src_dst_pairs":{"0":[24,26],"1":[24,28]},"failed_links":[[0,8]],"failed_cores":[9],"num_tors":8,"output_folder":"/run"}
```

but the simulator writes every value as the string rendering of a Java collection, so each field also accepts that rendering: `"{0=(24,26), 1=(24,28)}"`, `"[(0,8), (8,0)]"`, `"[Node#9, Node#10]"`, `"8"`. Those strings are tokenized, never evaluated, and anything unexpected is a malformed request.

A response maps each commodity id to its assignment, `{"0":1,"1":0}`, or carries a single `error` object with the kind and message of the failure.

*/

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize,Deserializer};
use serde::de::{MapAccess,Visitor};
use serde_json::{json,Map,Value};

use crate::commodity::{CommodityId,CommoditySet,HostId,Assignment};
use crate::error;
use crate::error::Error;
use crate::fairness::FailureState;
use crate::topology::{Link,NodeId};

#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum PairsField
{
	Map(PairEntries),
	Text(String),
}

///The members of a `src_dst_pairs` object in document order, keeping repeated keys so they can be rejected.
#[derive(Debug)]
struct PairEntries(Vec<(String,(HostId,HostId))>);

impl<'de> Deserialize<'de> for PairEntries
{
	fn deserialize<D:Deserializer<'de>>(deserializer:D) -> Result<PairEntries,D::Error>
	{
		struct EntriesVisitor;
		impl<'de> Visitor<'de> for EntriesVisitor
		{
			type Value = PairEntries;
			fn expecting(&self, formatter:&mut fmt::Formatter) -> fmt::Result
			{
				formatter.write_str("an object from commodity id to [source,destination]")
			}
			fn visit_map<A:MapAccess<'de>>(self, mut access:A) -> Result<PairEntries,A::Error>
			{
				let mut entries : Vec<(String,(HostId,HostId))> = Vec::with_capacity(access.size_hint().unwrap_or(0));
				while let Some(entry) = access.next_entry::<String,(HostId,HostId)>()?
				{
					entries.push(entry);
				}
				Ok(PairEntries(entries))
			}
		}
		deserializer.deserialize_map(EntriesVisitor)
	}
}

#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum LinksField
{
	List(Vec<(NodeId,NodeId)>),
	Text(String),
}

#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum NodesField
{
	List(Vec<NodeId>),
	Text(String),
}

#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum CountField
{
	Number(usize),
	Text(String),
}

#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum FlagField
{
	Bool(bool),
	Text(String),
}

#[derive(Debug,Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequest
{
	src_dst_pairs: PairsField,
	#[serde(default)]
	failed_links: Option<LinksField>,
	#[serde(default)]
	failed_cores: Option<NodesField>,
	#[serde(default)]
	num_tors: Option<CountField>,
	#[serde(default)]
	output_folder: Option<String>,
	#[serde(default)]
	fast_edge_coloring: Option<FlagField>,
}

///A decoded request of one control interval.
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct Request
{
	pub commodities: CommoditySet,
	pub failed_links: BTreeSet<Link>,
	pub failed_cores: BTreeSet<NodeId>,
	pub num_tors: Option<usize>,
	pub output_folder: Option<PathBuf>,
}

impl Request
{
	pub fn new(commodities:CommoditySet) -> Request
	{
		Request{ commodities, failed_links:BTreeSet::new(), failed_cores:BTreeSet::new(), num_tors:None, output_folder:None }
	}
	pub fn from_json(text:&str) -> Result<Request,Error>
	{
		let raw : RawRequest = serde_json::from_str(text).map_err(|e|{
			//Cut or garbled JSON may still be being written by the peer; a complete document with the wrong shape is final.
			let error = if e.is_eof() || e.is_syntax() { error!(incomplete_request) } else { error!(malformed_request) };
			error.with_message(format!("invalid request: {}",e))
		})?;
		let commodities = match raw.src_dst_pairs
		{
			PairsField::Map(PairEntries(entries)) =>
			{
				let mut pairs = Vec::with_capacity(entries.len());
				for (key,pair) in entries
				{
					let id : CommodityId = key.parse().map_err(|_|error!(malformed_request).with_message(format!("commodity id `{}` is not an integer",key)))?;
					//`01` or `+1` would name the same commodity as `1`.
					if id.to_string()!=key
					{
						return Err(error!(malformed_request).with_message(format!("commodity id `{}` is not written as {}",key,id)));
					}
					pairs.push((id,pair));
				}
				CommoditySet::try_from_pairs(pairs)?
			},
			PairsField::Text(text) => CommoditySet::try_from_pairs(parse_pairs_text(&text)?)?,
		};
		let failed_links = match raw.failed_links
		{
			None => BTreeSet::new(),
			Some(LinksField::List(list)) => list.into_iter().collect(),
			Some(LinksField::Text(text)) => parse_links_text(&text)?.into_iter().collect(),
		};
		let failed_cores = match raw.failed_cores
		{
			None => BTreeSet::new(),
			Some(NodesField::List(list)) => list.into_iter().collect(),
			Some(NodesField::Text(text)) => parse_nodes_text(&text)?.into_iter().collect(),
		};
		let num_tors = match raw.num_tors
		{
			None => None,
			Some(CountField::Number(n)) => Some(n),
			Some(CountField::Text(text)) => Some(text.trim().parse().map_err(|_|error!(malformed_request).with_message(format!("num_tors `{}` is not an integer",text)))?),
		};
		match raw.fast_edge_coloring
		{
			None | Some(FlagField::Bool(_)) => (),
			Some(FlagField::Text(text)) => match text.trim()
			{
				"true" | "false" => (),
				_ => return Err(error!(malformed_request).with_message(format!("fast_edge_coloring `{}` is not a boolean",text))),
			},
		}
		Ok(Request{
			commodities,
			failed_links,
			failed_cores,
			num_tors,
			output_folder: raw.output_folder.map(PathBuf::from),
		})
	}
	///The canonical JSON form.
	pub fn to_json(&self) -> Value
	{
		let pairs : Map<String,Value> = self.commodities.iter().map(|c|(c.id.to_string(),json!([c.source,c.destination]))).collect();
		let mut object = json!({
			"src_dst_pairs": pairs,
			"failed_links": self.failed_links.iter().map(|&(a,b)|json!([a,b])).collect::<Vec<_>>(),
			"failed_cores": self.failed_cores.iter().collect::<Vec<_>>(),
		});
		if let Some(n) = self.num_tors
		{
			object["num_tors"] = json!(n);
		}
		if let Some(folder) = &self.output_folder
		{
			object["output_folder"] = json!(folder.to_string_lossy());
		}
		object
	}
	pub fn failures(&self) -> FailureState
	{
		FailureState::new(self.failed_links.iter().copied(),self.failed_cores.iter().copied())
	}
	pub fn require_num_tors(&self) -> Result<usize,Error>
	{
		self.num_tors.ok_or_else(||error!(malformed_request).with_message("the request lacks num_tors".to_string()))
	}
}

///The answer to a request.
#[derive(Debug,Clone,PartialEq,Eq)]
pub enum Response
{
	Assignment(Assignment),
	Failure{ kind:String, message:String },
}

impl Response
{
	pub fn failure(error:&Error) -> Response
	{
		Response::Failure{
			kind: error.kind.label().to_string(),
			message: error.to_string(),
		}
	}
	pub fn to_json(&self) -> Value
	{
		match self
		{
			Response::Assignment(assignment) =>
			{
				let map : Map<String,Value> = assignment.iter().map(|(id,value)|(id.to_string(),json!(value))).collect();
				Value::Object(map)
			},
			Response::Failure{kind,message} => json!({"error":{"kind":kind,"message":message}}),
		}
	}
	pub fn from_json(text:&str) -> Result<Response,Error>
	{
		let value : Value = serde_json::from_str(text).map_err(|e|error!(malformed_request).with_message(format!("invalid response: {}",e)))?;
		let object = match value
		{
			Value::Object(object) => object,
			_ => return Err(error!(malformed_request).with_message("a response must be an object".to_string())),
		};
		if let Some(error) = object.get("error")
		{
			let field = |name:&str| error.get(name).and_then(Value::as_str).map(str::to_string).ok_or_else(||error!(malformed_request).with_message(format!("error response without {}",name)));
			return Ok(Response::Failure{ kind:field("kind")?, message:field("message")? });
		}
		let mut assignment = Assignment::new();
		for (key,value) in object
		{
			let id : CommodityId = key.parse().map_err(|_|error!(malformed_request).with_message(format!("commodity id `{}` is not an integer",key)))?;
			let value = value.as_u64().ok_or_else(||error!(malformed_request).with_message(format!("assignment of {} is not an integer",id)))?;
			assignment.insert(id,value as usize);
		}
		Ok(Response::Assignment(assignment))
	}
}

///Cursor over the string renderings of the simulator.
struct Scanner<'a>
{
	text: &'a str,
	position: usize,
}

impl<'a> Scanner<'a>
{
	fn new(text:&'a str) -> Scanner<'a>
	{
		Scanner{text,position:0}
	}
	fn rest(&self) -> &'a str
	{
		&self.text[self.position..]
	}
	fn fail(&self, expected:&str) -> Error
	{
		error!(malformed_request).with_message(format!("expected {} at offset {} of `{}`",expected,self.position,self.text))
	}
	fn skip_whitespace(&mut self)
	{
		let rest = self.rest();
		self.position += rest.len()-rest.trim_start().len();
	}
	fn peek(&mut self) -> Option<char>
	{
		self.skip_whitespace();
		self.rest().chars().next()
	}
	///Consume `c` if it is next.
	fn eat(&mut self, c:char) -> bool
	{
		if self.peek()==Some(c)
		{
			self.position += c.len_utf8();
			true
		}
		else
		{
			false
		}
	}
	fn expect(&mut self, c:char) -> Result<(),Error>
	{
		if self.eat(c) { Ok(()) } else { Err(self.fail(&format!("`{}`",c))) }
	}
	///Consume one of `options`, returning it.
	fn expect_one_of(&mut self, options:&[char]) -> Result<char,Error>
	{
		match self.peek()
		{
			Some(c) if options.contains(&c) =>
			{
				self.position += c.len_utf8();
				Ok(c)
			},
			_ => Err(self.fail(&format!("one of {:?}",options))),
		}
	}
	fn eat_str(&mut self, s:&str) -> bool
	{
		self.skip_whitespace();
		if self.rest().starts_with(s)
		{
			self.position += s.len();
			true
		}
		else
		{
			false
		}
	}
	fn number(&mut self) -> Result<usize,Error>
	{
		self.skip_whitespace();
		let digits = self.rest().chars().take_while(|c|c.is_ascii_digit()).count();
		if digits==0
		{
			return Err(self.fail("a number"));
		}
		let value = self.rest()[..digits].parse().map_err(|_|self.fail("a number that fits"))?;
		self.position += digits;
		Ok(value)
	}
	fn finish(&mut self) -> Result<(),Error>
	{
		if self.peek().is_some() { Err(self.fail("the end")) } else { Ok(()) }
	}
	///A sequence `open item, item, ... close`, where the closing delimiter matches the opening one.
	fn sequence<T,F:FnMut(&mut Scanner<'a>)->Result<T,Error>>(&mut self, opening:&[char], mut item:F) -> Result<Vec<T>,Error>
	{
		let open = self.expect_one_of(opening)?;
		let close = closing_of(open);
		let mut items = vec![];
		if self.eat(close)
		{
			return Ok(items);
		}
		loop
		{
			items.push(item(self)?);
			if self.eat(close)
			{
				return Ok(items);
			}
			self.expect(',')?;
		}
	}
	///`(a,b)` or `[a,b]`.
	fn pair(&mut self) -> Result<(usize,usize),Error>
	{
		let open = self.expect_one_of(&['(','['])?;
		let a = self.number()?;
		self.expect(',')?;
		let b = self.number()?;
		self.expect(closing_of(open))?;
		Ok((a,b))
	}
}

fn closing_of(open:char) -> char
{
	match open
	{
		'(' => ')',
		'[' => ']',
		_ => '}',
	}
}

///Parse `{0=(24, 26), 1=(24, 28)}`.
pub fn parse_pairs_text(text:&str) -> Result<Vec<(CommodityId,(HostId,HostId))>,Error>
{
	let mut scanner = Scanner::new(text);
	let pairs = scanner.sequence(&['{'],|s|{
		let id = s.number()?;
		s.expect('=')?;
		Ok((id,s.pair()?))
	})?;
	scanner.finish()?;
	Ok(pairs)
}

///Parse `[(1,2), (3,4)]`, also with brackets for the pairs or braces outside.
pub fn parse_links_text(text:&str) -> Result<Vec<Link>,Error>
{
	let mut scanner = Scanner::new(text);
	let links = scanner.sequence(&['[','{'],|s|s.pair())?;
	scanner.finish()?;
	Ok(links)
}

///Parse `[9, 10]` or `[Node#9, Node#10]`.
pub fn parse_nodes_text(text:&str) -> Result<Vec<NodeId>,Error>
{
	let mut scanner = Scanner::new(text);
	let nodes = scanner.sequence(&['[','{'],|s|{
		s.eat_str("Node#");
		s.number()
	})?;
	scanner.finish()?;
	Ok(nodes)
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::ErrorKind;
	#[test]
	fn canonical_request()
	{
		let request = Request::from_json(r#"{"src_dst_pairs":{"0":[24,26],"1":[24,28]},"failed_links":[[0,8]],"failed_cores":[9],"num_tors":8,"output_folder":"/run"}"#).unwrap();
		assert_eq!(request.commodities.len(),2);
		assert_eq!(request.commodities.iter().nth(1).map(|c|c.destination).unwrap(),28);
		assert!(request.failed_links.contains(&(0,8)));
		assert!(request.failed_cores.contains(&9));
		assert_eq!(request.num_tors,Some(8));
		assert_eq!(Request::from_json(&request.to_json().to_string()).unwrap(),request);
	}
	#[test]
	fn simulator_rendering()
	{
		let text = r#"{"src_dst_pairs":"{0=(24,26), 1=(24, 28)}","failed_links":"[(0,8), (8,0)]","failed_cores":"[Node#9, Node#10]","num_tors":"8"}"#;
		let request = Request::from_json(text).unwrap();
		assert_eq!(request.commodities.ids().collect::<Vec<_>>(),vec![0,1]);
		assert_eq!(request.failed_links.len(),2);
		assert_eq!(request.failed_cores.iter().copied().collect::<Vec<_>>(),vec![9,10]);
		assert_eq!(request.require_num_tors().unwrap(),8);
		let coloring = Request::from_json(r#"{"src_dst_pairs":"{}","output_folder":"/run","fast_edge_coloring":"true"}"#).unwrap();
		assert!(coloring.commodities.is_empty());
		assert!(coloring.require_num_tors().is_err());
	}
	#[test]
	fn malformed_requests()
	{
		for text in [
			r#"{"failed_cores":[1]}"#,
			r#"{"src_dst_pairs":{},"colour":1}"#,
			r#"{"src_dst_pairs":"{0=(1,2)"}"#,
			r#"{"src_dst_pairs":"{0=(1,2]}"}"#,
			r#"{"src_dst_pairs":"{0=(1,2)} trailing"}"#,
			r#"{"src_dst_pairs":"__import__('os')"}"#,
			r#"{"src_dst_pairs":{"a":[1,2]}}"#,
			r#"{"src_dst_pairs":{},"failed_cores":"[Switch#3]"}"#,
			r#"{"src_dst_pairs":{},"fast_edge_coloring":"maybe"}"#,
			r#"{"src_dst_pairs":{"1":[10,20],"01":[11,21]}}"#,
			r#"{"src_dst_pairs":{"1":[10,20],"1":[11,21]}}"#,
			r#"{"src_dst_pairs":{" 2":[10,20]}}"#,
			r#"{"src_dst_pairs":"{0=(1,2), 0=(3,4)}"}"#,
		]
		{
			let error = Request::from_json(text).err().unwrap_or_else(||panic!("`{}` was accepted",text));
			assert!(matches!(error.kind,ErrorKind::MalformedRequest),"{}: {}",text,error);
		}
		//Documents that are not complete JSON may still be being written.
		for text in ["","{",r#"{"src_dst_pairs":{"0":[1,"#,"not json"]
		{
			let error = Request::from_json(text).err().unwrap_or_else(||panic!("`{}` was accepted",text));
			assert!(matches!(error.kind,ErrorKind::IncompleteRequest),"{}: {}",text,error);
		}
	}
	#[test]
	fn responses()
	{
		let assignment : Assignment = vec![(0,1),(5,0)].into_iter().collect();
		let response = Response::Assignment(assignment);
		assert_eq!(response.to_json().to_string(),r#"{"0":1,"5":0}"#);
		assert_eq!(Response::from_json(&response.to_json().to_string()).unwrap(),response);
		let failure = Response::failure(&error!(infeasible).with_message("no path".to_string()));
		let text = failure.to_json().to_string();
		assert!(text.starts_with(r#"{"error":{"kind":"infeasible""#),"{}",text);
		assert_eq!(Response::from_json(&text).unwrap(),failure);
	}
}
